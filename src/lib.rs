//! Core library for valform, a YAML values editor kept in sync with a form generated
//! from a JSON Schema.
//! Provides the document model, changed-path diffing, the schema-driven form model and
//! the controller that keeps the text and form views consistent in both directions.

pub mod codec;
pub mod config;
pub mod diff;
pub mod form;
mod gui;
pub mod path;
pub mod schema;
pub mod source;
pub mod statics;
pub mod sync;
mod value;

pub use codec::{ParseError, decode, encode};
pub use config::EditorConfig;
pub use diff::{Change, ChangeSet, diff};
pub use form::{FieldId, FormEdit, FormError, FormEvent, FormModel, FormOptions, OverridePolicy};
pub use gui::run_gui;
pub use path::Path;
pub use schema::{PropertyOrder, SchemaNode};
pub use sync::{SyncController, SyncStatus, TextEditor};
pub use value::{Number, Value};
