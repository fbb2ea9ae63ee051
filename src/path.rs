//! Dot-separated addressing over documents and form fields.
//!
//! A path is a list of string segments. Numeric segments are only read as array
//! indexes while walking through an array; under an object, `"0"` is an ordinary
//! property name. Map entries can also be addressed by position with the reserved
//! `[key]` / `[value]` markers (`labels.0.[key]`), which is how the key input of a
//! free-form map entry gets an address of its own.

use crate::Value;
use indexmap::IndexMap;
use std::{fmt, str::FromStr};

pub const SEPARATOR: char = '.';
pub const MAP_KEY_MARKER: &str = "[key]";
pub const MAP_VALUE_MARKER: &str = "[value]";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("cannot descend into {found} at `{path}`")]
    NotAContainer { path: Path, found: &'static str },
    #[error("index {index} is out of bounds for array of length {len} at `{path}`")]
    IndexOutOfBounds { path: Path, index: usize, len: usize },
    #[error("`{segment}` is not an array index (at `{path}`)")]
    NotAnIndex { path: Path, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Path {
    segments: Vec<String>,
}

/// Where a path lands relative to the first array it crosses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayItemRef {
    pub array_path: Path,
    pub index: usize,
    pub remainder: Path,
}

/// Parse a segment as an array index: ASCII digits, no sign, no leading zeros.
pub fn index_segment(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    segment.parse().ok()
}

pub fn is_marker(segment: &str) -> bool {
    segment == MAP_KEY_MARKER || segment == MAP_VALUE_MARKER
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn child(&self, segment: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Path { segments }
    }

    pub fn index(&self, index: usize) -> Path {
        self.child(index.to_string())
    }

    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, rest) = self.segments.split_last()?;
        Some(Path {
            segments: rest.to_vec(),
        })
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Split at the first purely numeric segment: `<arrayPath>.<index>.<remainder>`.
    ///
    /// This is purely textual. Whether `arrayPath` really is an array has to be
    /// checked against the document or the form (see `FormModel::owning_array`).
    pub fn classify(&self) -> Option<ArrayItemRef> {
        let pos = self
            .segments
            .iter()
            .position(|s| index_segment(s).is_some())?;
        let index = index_segment(&self.segments[pos])?;
        Some(ArrayItemRef {
            array_path: Path {
                segments: self.segments[..pos].to_vec(),
            },
            index,
            remainder: Path {
                segments: self.segments[pos + 1..].to_vec(),
            },
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::from(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return Path::root();
        }
        Path {
            segments: s.split(SEPARATOR).map(str::to_owned).collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolve `path` in `tree`. Any missing step yields `None`; never panics.
pub fn get<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.segments() {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(index_segment(segment)?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Scalars met on the way are replaced by objects. Arrays are only descended by
/// index; writing at `index == len` appends.
pub fn set(tree: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    let mut node = tree;
    for (depth, segment) in path.segments().iter().enumerate() {
        if !node.is_container() {
            *node = Value::Object(IndexMap::new());
        }
        node = match node {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            Value::Array(items) => {
                let here = || Path {
                    segments: path.segments()[..depth].to_vec(),
                };
                let Some(index) = index_segment(segment) else {
                    return Err(PathError::NotAnIndex {
                        path: here(),
                        segment: segment.clone(),
                    });
                };
                if index > items.len() {
                    return Err(PathError::IndexOutOfBounds {
                        path: here(),
                        index,
                        len: items.len(),
                    });
                }
                if index == items.len() {
                    items.push(Value::Null);
                }
                &mut items[index]
            }
            other => {
                return Err(PathError::NotAContainer {
                    path: path.clone(),
                    found: other.type_name(),
                });
            }
        };
    }
    *node = value;
    Ok(())
}

/// Every path below `root` inside `value`, parents before children.
pub fn descendants(value: &Value, root: &Path, out: &mut Vec<Path>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = root.child(key.clone());
                out.push(path.clone());
                descendants(child, &path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = root.index(i);
                out.push(path.clone());
                descendants(child, &path, out);
            }
        }
        _ => {}
    }
}
