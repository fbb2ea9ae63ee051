//! YAML encode/decode for the values document.

use crate::Value;
use std::fmt;

/// A decode failure, positioned when the YAML parser knows where it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// 1-based line, when known.
    pub line: Option<usize>,
    /// 1-based column, when known.
    pub column: Option<usize>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "line {line}, column {column}: {}", self.message)
            }
            (Some(line), None) => write!(f, "line {line}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        let location = err.location();
        ParseError {
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }
}

/// Decode YAML text. Blank text (or a lone `null`) is an empty document, not an error.
pub fn decode(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Ok(Value::object());
    }
    let value: Value = serde_yaml::from_str(text)?;
    Ok(match value {
        Value::Null => Value::object(),
        other => other,
    })
}

pub fn encode(value: &Value) -> String {
    if let Value::Object(map) = value
        && map.is_empty()
    {
        return String::new();
    }
    // Serializing our own tree cannot hit the unsupported-type paths of serde_yaml.
    serde_yaml::to_string(value).unwrap_or_default()
}
