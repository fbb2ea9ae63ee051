//! Startup sources (schema and initial values) and the export action.

use crate::schema::SchemaNode;
use crate::statics;
use anyhow::Context;
use std::{fs, path::Path};

pub fn load_schema(path: &Path) -> anyhow::Result<SchemaNode> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    let schema = SchemaNode::parse_json(&text).with_context(|| format!("parsing schema {path:?}"))?;
    log::info!(
        "loaded schema {path:?} ({} top-level properties)",
        schema.properties.len()
    );
    Ok(schema)
}

/// Read the initial values text. The text is not decoded here: an invalid file
/// still opens in the text editor, flagged as invalid.
pub fn load_values(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
    let text = String::from_utf8(bytes).context("values file is not valid UTF-8")?;
    log::info!("loaded values {path:?} ({} bytes)", text.len());
    Ok(text)
}

/// Write the text view to `path` exactly as it is.
pub fn export_values(path: &Path, text: &str) -> anyhow::Result<()> {
    fs::write(path, text.as_bytes()).with_context(|| format!("writing {path:?}"))?;
    log::info!("exported {} bytes ({}) to {path:?}", text.len(), statics::EXPORT_MIME);
    Ok(())
}

/// Native save dialog preset for `values.yaml`.
pub fn export_dialog(dir: Option<&Path>) -> rfd::FileDialog {
    let mut dlg = rfd::FileDialog::new()
        .add_filter(statics::EXPORT_FILTER_NAME, statics::EXPORT_FILTER_EXTENSIONS)
        .set_file_name(statics::EXPORT_FILE_NAME);
    if let Some(dir) = dir {
        dlg = dlg.set_directory(dir);
    }
    dlg
}
