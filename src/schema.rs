//! The JSON Schema subset the form understands, and a lazy depth-first walker over it.
//!
//! Supported keywords: `type` (string or list, `null` marks the node nullable),
//! `title`, `description`, `properties`, `required`, `items`, `enum`, `default`,
//! `additionalProperties`, `minimum`, `maximum` and the `x-required-if` extension,
//! which names a sibling property whose truthiness makes this property required.
//! Everything else is ignored.

use crate::path::Path;
use crate::Value;
use indexmap::IndexMap;
use std::rc::Rc;

pub const ENABLED_PROPERTY: &str = "enabled";
pub const REQUIRED_IF_KEYWORD: &str = "x-required-if";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    Syntax(String),
    #[error("schema node at `{path}` is not an object")]
    NotAnObject { path: Path },
    #[error("`{keyword}` at `{path}` must be {expected}")]
    InvalidKeyword {
        path: Path,
        keyword: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("`{input}` is not a valid {expected}")]
    Malformed { input: String, expected: &'static str },
    #[error("`{input}` is out of range ({range})")]
    OutOfRange { input: String, range: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ScalarType {
    /// Convert renderer text into a typed value. Blank numeric input clears the field (`Null`).
    pub fn parse_input(self, text: &str) -> Result<Value, InputError> {
        let invalid = |expected| InputError::Malformed {
            input: text.to_owned(),
            expected,
        };
        let trimmed = text.trim();
        match self {
            ScalarType::String => Ok(Value::String(text.to_owned())),
            _ if trimmed.is_empty() => Ok(Value::Null),
            ScalarType::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid("integer")),
            ScalarType::Number => {
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(Value::from(v));
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(Value::from(v)),
                    _ => Err(invalid("number")),
                }
            }
            ScalarType::Boolean => match trimmed {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid("boolean")),
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Integer => "integer",
            ScalarType::Boolean => "boolean",
        }
    }
}

/// Exactly one classification per node; see [`SchemaNode::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Map,
    Array,
    Enum,
    Scalar(ScalarType),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    #[default]
    Unspecified,
    Allowed(bool),
    Schema(Rc<SchemaNode>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// Declared types other than `null`, in declaration order.
    pub types: Vec<String>,
    pub nullable: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub properties: IndexMap<String, Rc<SchemaNode>>,
    pub required: Vec<String>,
    pub items: Option<Rc<SchemaNode>>,
    pub enum_values: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub additional_properties: AdditionalProperties,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub required_if: Option<String>,
}

impl SchemaNode {
    pub fn of_type(ty: &str) -> Self {
        SchemaNode {
            types: vec![ty.to_owned()],
            ..Default::default()
        }
    }

    pub fn parse_json(text: &str) -> Result<SchemaNode, SchemaError> {
        let value = Value::parse_json5(text).map_err(|e| SchemaError::Syntax(format!("{e:#}")))?;
        SchemaNode::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<SchemaNode, SchemaError> {
        Self::from_value_at(value, &Path::root())
    }

    fn from_value_at(value: &Value, at: &Path) -> Result<SchemaNode, SchemaError> {
        let Some(obj) = value.as_object() else {
            return Err(SchemaError::NotAnObject { path: at.clone() });
        };
        let invalid = |keyword, expected| SchemaError::InvalidKeyword {
            path: at.clone(),
            keyword,
            expected,
        };

        let mut node = SchemaNode::default();

        match obj.get("type") {
            None => {}
            Some(Value::String(ty)) => node.push_type(ty),
            Some(Value::Array(types)) => {
                for ty in types {
                    let ty = ty
                        .as_str()
                        .ok_or_else(|| invalid("type", "a string or a list of strings"))?;
                    node.push_type(ty);
                }
            }
            Some(_) => return Err(invalid("type", "a string or a list of strings")),
        }

        node.title = optional_string(obj.get("title")).map_err(|_| invalid("title", "a string"))?;
        node.description = optional_string(obj.get("description"))
            .map_err(|_| invalid("description", "a string"))?;
        node.required_if = optional_string(obj.get(REQUIRED_IF_KEYWORD))
            .map_err(|_| invalid(REQUIRED_IF_KEYWORD, "a string"))?;

        if let Some(props) = obj.get("properties") {
            let props = props
                .as_object()
                .ok_or_else(|| invalid("properties", "an object"))?;
            let props_path = at.child("properties");
            for (name, child) in props {
                let child = Self::from_value_at(child, &props_path.child(name.clone()))?;
                node.properties.insert(name.clone(), Rc::new(child));
            }
        }

        if let Some(required) = obj.get("required") {
            let list = required
                .as_array()
                .ok_or_else(|| invalid("required", "a list of strings"))?;
            for name in list {
                let name = name
                    .as_str()
                    .ok_or_else(|| invalid("required", "a list of strings"))?;
                node.required.push(name.to_owned());
            }
        }

        if let Some(items) = obj.get("items") {
            if !items.is_object() {
                return Err(invalid("items", "a schema object"));
            }
            node.items = Some(Rc::new(Self::from_value_at(items, &at.child("items"))?));
        }

        if let Some(values) = obj.get("enum") {
            let values = values.as_array().ok_or_else(|| invalid("enum", "a list"))?;
            node.enum_values = Some(values.to_vec());
        }

        node.default = obj.get("default").cloned();

        node.additional_properties = match obj.get("additionalProperties") {
            None => AdditionalProperties::Unspecified,
            Some(Value::Bool(b)) => AdditionalProperties::Allowed(*b),
            Some(v @ Value::Object(_)) => AdditionalProperties::Schema(Rc::new(
                Self::from_value_at(v, &at.child("additionalProperties"))?,
            )),
            Some(_) => {
                return Err(invalid(
                    "additionalProperties",
                    "a boolean or a schema object",
                ));
            }
        };

        node.minimum = optional_number(obj.get("minimum")).map_err(|_| invalid("minimum", "a number"))?;
        node.maximum = optional_number(obj.get("maximum")).map_err(|_| invalid("maximum", "a number"))?;

        Ok(node)
    }

    fn push_type(&mut self, ty: &str) {
        if ty == "null" {
            self.nullable = true;
        } else {
            self.types.push(ty.to_owned());
        }
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    pub fn kind(&self) -> SchemaKind {
        if self.enum_values.as_ref().is_some_and(|v| !v.is_empty()) {
            return SchemaKind::Enum;
        }
        match self.primary_type() {
            // `additionalProperties: false` closes the object: no entries can be added.
            Some("object")
                if self.properties.is_empty()
                    && self.additional_properties != AdditionalProperties::Allowed(false) =>
            {
                SchemaKind::Map
            }
            Some("object") => SchemaKind::Object,
            None if !self.properties.is_empty() => SchemaKind::Object,
            Some("array") => SchemaKind::Array,
            _ => SchemaKind::Scalar(self.scalar_type()),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self.primary_type() {
            Some("integer") => ScalarType::Integer,
            Some("number") => ScalarType::Number,
            Some("boolean") => ScalarType::Boolean,
            _ => ScalarType::String,
        }
    }

    /// Schema of array items; plain strings when `items` is absent.
    pub fn item_schema(&self) -> Rc<SchemaNode> {
        self.items
            .clone()
            .unwrap_or_else(|| Rc::new(SchemaNode::of_type("string")))
    }

    /// Schema of free-form map values; plain strings unless `additionalProperties` says otherwise.
    pub fn value_schema(&self) -> Rc<SchemaNode> {
        match &self.additional_properties {
            AdditionalProperties::Schema(schema) => schema.clone(),
            _ => Rc::new(SchemaNode::of_type("string")),
        }
    }

    /// `minimum`/`maximum` as shown next to numeric inputs.
    pub fn range_hint(&self) -> Option<String> {
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) => Some(format!("{min}..={max}")),
            (Some(min), None) => Some(format!(">= {min}")),
            (None, Some(max)) => Some(format!("<= {max}")),
            (None, None) => None,
        }
    }

    /// Renderer text for this node, typed and checked against `minimum`/`maximum`.
    pub fn parse_input(&self, text: &str) -> Result<Value, InputError> {
        let value = self.scalar_type().parse_input(text)?;
        if let Value::Number(n) = &value {
            let n = n.as_f64();
            let below = self.minimum.is_some_and(|min| n < min);
            let above = self.maximum.is_some_and(|max| n > max);
            if below || above {
                return Err(InputError::OutOfRange {
                    input: text.trim().to_owned(),
                    range: self.range_hint().unwrap_or_default(),
                });
            }
        }
        Ok(value)
    }

    pub fn display_label<'a>(&'a self, name: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(name)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    /// Properties in the requested display order.
    pub fn ordered_properties(&self, order: PropertyOrder) -> Vec<(&str, &Rc<SchemaNode>)> {
        let mut props: Vec<_> = self
            .properties
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
            .collect();
        if order == PropertyOrder::Alphabetical {
            props.sort_by_cached_key(|(name, schema)| schema.display_label(name).to_lowercase());
        }
        props
    }
}

fn optional_string(value: Option<&Value>) -> Result<Option<String>, ()> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(()),
    }
}

fn optional_number(value: Option<&Value>) -> Result<Option<f64>, ()> {
    match value {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.as_f64())),
        Some(_) => Err(()),
    }
}

/// Whether a property is required, beyond the static `required` list of its parent.
pub trait RequiredRule {
    /// `Some` decides the question; `None` defers to the parent's `required` list.
    fn evaluate(
        &self,
        property: &str,
        schema: &SchemaNode,
        siblings: &IndexMap<String, Value>,
    ) -> Option<bool>;
}

/// `x-required-if: <sibling>` makes a property required while that sibling is truthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingFlagRule;

impl RequiredRule for SiblingFlagRule {
    fn evaluate(
        &self,
        _property: &str,
        schema: &SchemaNode,
        siblings: &IndexMap<String, Value>,
    ) -> Option<bool> {
        let sibling = schema.required_if.as_deref()?;
        Some(siblings.get(sibling).is_some_and(Value::is_truthy))
    }
}

/// Property display order. Declaration order is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyOrder {
    #[default]
    Declaration,
    Alphabetical,
}

#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: Path,
    /// Property name, `None` for the walk root.
    pub name: Option<String>,
    pub schema: Rc<SchemaNode>,
    pub kind: SchemaKind,
    pub required: bool,
    pub depth: usize,
    /// Schema of the `enabled` property hoisted into this object's header.
    pub toggle: Option<Rc<SchemaNode>>,
}

struct Pending {
    schema: Rc<SchemaNode>,
    path: Path,
    name: Option<String>,
    required: bool,
    depth: usize,
}

/// Depth-first walk over object properties. Array items and map values are not
/// descended into: their instances only exist once the document provides them.
pub struct SchemaWalker {
    stack: Vec<Pending>,
    order: PropertyOrder,
}

impl SchemaWalker {
    pub fn new(schema: Rc<SchemaNode>, base: Path, order: PropertyOrder) -> Self {
        SchemaWalker {
            stack: vec![Pending {
                schema,
                path: base,
                name: None,
                required: false,
                depth: 0,
            }],
            order,
        }
    }
}

impl Iterator for SchemaWalker {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        let Pending {
            schema,
            path,
            name,
            required,
            depth,
        } = self.stack.pop()?;
        let kind = schema.kind();

        let mut toggle = None;
        if kind == SchemaKind::Object {
            let props = schema.ordered_properties(self.order);
            let mut children = Vec::with_capacity(props.len());
            for (prop, child) in props {
                if prop == ENABLED_PROPERTY && !path.is_root() {
                    toggle = Some(child.clone());
                    continue;
                }
                children.push(Pending {
                    schema: child.clone(),
                    path: path.child(prop),
                    name: Some(prop.to_owned()),
                    required: schema.is_required(prop),
                    depth: depth + 1,
                });
            }
            self.stack.extend(children.into_iter().rev());
        }

        Some(WalkEntry {
            path,
            name,
            schema,
            kind,
            required,
            depth,
            toggle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        InputError, PropertyOrder, RequiredRule, ScalarType, SchemaError, SchemaKind, SchemaNode,
        SchemaWalker, SiblingFlagRule,
    };
    use crate::path::Path;
    use crate::Value;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    const SCHEMA: &str = r#"{
        "type": "object",
        "required": ["replicas"],
        "properties": {
            "replicas": { "type": "integer", "default": 1, "minimum": 0 },
            "image": {
                "type": "object",
                "properties": {
                    "repository": { "type": "string", "title": "Zeta repo" },
                    "tag": { "type": ["string", "null"] },
                    "pullPolicy": { "enum": ["Always", "IfNotPresent"] }
                }
            },
            "ingress": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "host": { "type": "string", "x-required-if": "enabled" }
                }
            },
            "labels": { "type": "object", "additionalProperties": { "type": "string" } },
            "ports": { "type": "array", "items": { "type": "integer" } },
            "enabled": { "type": "boolean" }
        }
    }"#;

    fn walk(order: PropertyOrder) -> Vec<(String, SchemaKind)> {
        let schema = Rc::new(SchemaNode::parse_json(SCHEMA).unwrap());
        SchemaWalker::new(schema, Path::root(), order)
            .map(|e| (e.path.to_string(), e.kind))
            .collect()
    }

    #[test]
    fn classification_is_exclusive() {
        let schema = SchemaNode::parse_json(SCHEMA).unwrap();
        let kind = |name: &str| schema.properties[name].kind();
        assert_eq!(schema.kind(), SchemaKind::Object);
        assert_eq!(kind("replicas"), SchemaKind::Scalar(ScalarType::Integer));
        assert_eq!(kind("image"), SchemaKind::Object);
        assert_eq!(kind("labels"), SchemaKind::Map);
        assert_eq!(kind("ports"), SchemaKind::Array);
        assert_eq!(
            schema.properties["image"].properties["pullPolicy"].kind(),
            SchemaKind::Enum
        );
        let tag = &schema.properties["image"].properties["tag"];
        assert!(tag.nullable);
        assert_eq!(tag.kind(), SchemaKind::Scalar(ScalarType::String));
    }

    #[test]
    fn closed_object_without_properties_is_not_a_map() {
        let closed = SchemaNode::parse_json(r#"{"type":"object","additionalProperties":false}"#).unwrap();
        assert_eq!(closed.kind(), SchemaKind::Object);
        let open = SchemaNode::parse_json(r#"{"type":"object","additionalProperties":true}"#).unwrap();
        assert_eq!(open.kind(), SchemaKind::Map);
        let bare = SchemaNode::parse_json(r#"{"type":"object"}"#).unwrap();
        assert_eq!(bare.kind(), SchemaKind::Map);
    }

    #[test]
    fn walker_is_depth_first_in_declaration_order_and_hoists_enabled() {
        let entries = walk(PropertyOrder::Declaration);
        let paths: Vec<_> = entries.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "",
                "replicas",
                "image",
                "image.repository",
                "image.tag",
                "image.pullPolicy",
                "ingress",
                "ingress.host",
                "labels",
                "ports",
                "enabled",
            ]
        );

        let schema = Rc::new(SchemaNode::parse_json(SCHEMA).unwrap());
        let ingress = SchemaWalker::new(schema, Path::root(), PropertyOrder::Declaration)
            .find(|e| e.path == Path::from("ingress"))
            .unwrap();
        assert!(ingress.toggle.is_some());
    }

    #[test]
    fn walker_alphabetical_uses_display_labels() {
        let entries = walk(PropertyOrder::Alphabetical);
        let image: Vec<_> = entries
            .iter()
            .map(|(p, _)| p.as_str())
            .filter(|p| p.starts_with("image."))
            .collect();
        assert_eq!(image, vec!["image.pullPolicy", "image.tag", "image.repository"]);
    }

    #[test]
    fn required_comes_from_nearest_parent() {
        let schema = Rc::new(SchemaNode::parse_json(SCHEMA).unwrap());
        let replicas = SchemaWalker::new(schema, Path::root(), PropertyOrder::Declaration)
            .find(|e| e.path == Path::from("replicas"))
            .unwrap();
        assert!(replicas.required);
    }

    #[test]
    fn sibling_flag_rule_follows_the_named_sibling() {
        let schema = SchemaNode::parse_json(SCHEMA).unwrap();
        let host = &schema.properties["ingress"].properties["host"];
        let mut siblings = IndexMap::new();
        assert_eq!(SiblingFlagRule.evaluate("host", host, &siblings), Some(false));
        siblings.insert("enabled".to_owned(), Value::Bool(true));
        assert_eq!(SiblingFlagRule.evaluate("host", host, &siblings), Some(true));
        let repo = &schema.properties["image"].properties["repository"];
        assert_eq!(SiblingFlagRule.evaluate("repository", repo, &siblings), None);
    }

    #[test]
    fn parse_input_is_typed() {
        assert_eq!(ScalarType::Integer.parse_input(" 7 ").unwrap(), Value::from(7_i64));
        assert!(ScalarType::Integer.parse_input("7.5").is_err());
        assert_eq!(ScalarType::Number.parse_input("7.5").unwrap(), Value::from(7.5));
        assert_eq!(ScalarType::Number.parse_input("").unwrap(), Value::Null);
        assert_eq!(ScalarType::Boolean.parse_input("true").unwrap(), Value::Bool(true));
        assert_eq!(ScalarType::String.parse_input(" x ").unwrap(), Value::from(" x "));
    }

    #[test]
    fn malformed_schema_reports_location() {
        let err = SchemaNode::parse_json(r#"{ "properties": { "a": { "type": 5 } } }"#).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidKeyword {
                path: Path::from("properties.a"),
                keyword: "type",
                expected: "a string or a list of strings",
            }
        );
        assert!(matches!(
            SchemaNode::parse_json("[1]"),
            Err(SchemaError::NotAnObject { .. })
        ));
        assert!(matches!(
            SchemaNode::parse_json("{"),
            Err(SchemaError::Syntax(_))
        ));
    }

    #[test]
    fn input_outside_bounds_is_rejected() {
        let node = SchemaNode::parse_json(r#"{"type":"integer","minimum":0,"maximum":10}"#).unwrap();
        assert_eq!(node.range_hint().as_deref(), Some("0..=10"));
        assert_eq!(node.parse_input("10").unwrap(), Value::from(10_i64));
        assert_eq!(node.parse_input("").unwrap(), Value::Null);
        assert_eq!(
            node.parse_input("99"),
            Err(InputError::OutOfRange {
                input: "99".to_owned(),
                range: "0..=10".to_owned(),
            })
        );
        assert!(matches!(node.parse_input("-5"), Err(InputError::OutOfRange { .. })));
        assert!(matches!(node.parse_input("x"), Err(InputError::Malformed { .. })));

        let floor = SchemaNode::parse_json(r#"{"type":"number","minimum":0.5}"#).unwrap();
        assert_eq!(floor.range_hint().as_deref(), Some(">= 0.5"));
        assert!(floor.parse_input("0.25").is_err());
        assert_eq!(floor.parse_input("1e3").unwrap(), Value::from(1000.0));
    }
}
