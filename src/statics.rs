// Central place for UI strings and other non-localized constants.
// Keep these out of gui.rs to reduce duplication and make tweaks safer.

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "valform: values editor";

pub const EN_BTN_EXPORT: &str = "Export...";
pub const EN_BTN_RELOAD: &str = "Reload";
pub const EN_BTN_ABOUT: &str = "About";
pub const EN_BTN_TOGGLE_THEME: &str = "Theme";

pub const EN_WINDOW_ABOUT: &str = "About";

pub const EN_ABOUT_HEADING: &str = "valform: values editor";
pub const EN_ABOUT_VERSION: &str = "Version:";
pub const EN_ABOUT_USAGE: &str = "Usage: valform [values.yaml] [schema.json]";
pub const EN_ABOUT_SYNC: &str =
    "Edit either side: the text and the form follow each other after a short pause.";
pub const EN_ABOUT_LOGGING: &str = "Set RUST_LOG=debug for sync diagnostics.";

pub const EN_HEADING_TEXT: &str = "values.yaml";
pub const EN_HEADING_FORM: &str = "Form";

pub const EN_STATUS_VALID: &str = "YAML valid";
pub const EN_STATUS_INVALID: &str = "YAML invalid";
pub const EN_STATUS_PENDING: &str = "syncing...";
pub const EN_DEGRADED_FORM: &str = "No form available: the schema could not be loaded. The text editor still works.";
pub const EN_EMPTY_SCHEMA: &str = "The schema has no properties.";

pub const EN_COL_KEY: &str = "Key";
pub const EN_COL_VALUE: &str = "Value";
pub const EN_COL_INDEX: &str = "Index";
pub const EN_COL_ACTIONS: &str = "";

pub const EN_BTN_ADD_ITEM: &str = "Add item";
pub const EN_BTN_ADD_ENTRY: &str = "Add entry";
pub const EN_BTN_DELETE: &str = "Delete";
pub const EN_BTN_UP: &str = "Up";
pub const EN_BTN_DOWN: &str = "Down";
pub const EN_BTN_RESET: &str = "Reset";
pub const EN_BTN_CLEAR: &str = "Clear";

pub const EN_HINT_KEY: &str = "key";
pub const EN_HINT_UNSET: &str = "(unset)";
pub const EN_MARK_REQUIRED: &str = "*";
pub const EN_TIP_REQUIRED: &str = "Required";
pub const EN_TIP_RESET: &str = "Drop the override and fall back to the default";
pub const EN_TIP_NUMERIC_KEY: &str = "Numeric keys are kept in ascending order";
pub const EN_LABEL_UNMAPPED: &str = "Not covered by the schema (kept as-is):";
pub const EN_LABEL_EXTRA_KEYS: &str = "Keys not in the schema (kept as-is):";
pub const EN_PREFIX_DEFAULT: &str = "default: ";
pub const EN_PREFIX_RANGE: &str = "range: ";

pub const EN_ERR_PREFIX_SCHEMA: &str = "Failed to load schema";
pub const EN_ERR_PREFIX_VALUES: &str = "Failed to load values";
pub const EN_ERR_PREFIX_EXPORT: &str = "Failed to export";

// Files and export.
pub const DEFAULT_VALUES_FILE: &str = "values.yaml";
pub const DEFAULT_SCHEMA_FILE: &str = "values.schema.json";
pub const EXPORT_FILE_NAME: &str = "values.yaml";
pub const EXPORT_MIME: &str = "text/yaml";
pub const EXPORT_FILTER_NAME: &str = "YAML";
pub const EXPORT_FILTER_EXTENSIONS: &[&str] = &["yaml", "yml"];

// Sync timing.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
