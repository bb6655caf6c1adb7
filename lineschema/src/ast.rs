/// Lineschema data model: the schema header, the field declarations and the
/// parsed document. Every derived artifact (JSON Schema, gjson path,
/// instruction list) is a pure function of these values.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::path;

/// Dialect written into `version` when none is known.
pub const DEFAULT_VERSION: &str = "http://json-schema.org/draft-07/schema#";
/// Schema id used when a converted document does not name one.
pub const DEFAULT_ID: &str = "example";

/// Which side of the binding a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Request-shaped data; `src` is implicit.
    In,
    /// Response-shaped data; `dst` is implicit and containers get initialized.
    Out,
    /// Internal reshaping between two documents.
    Convert,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Direction> {
        match s {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            "convert" => Some(Direction::Convert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Convert => "convert",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six JSON Schema `type` keywords a field may declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    /// Accepts the JSON Schema spelling plus the `int`/`bool` shorthands
    /// found in hand-written lineschemas.
    pub fn parse(s: &str) -> Option<SchemaType> {
        match s {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" | "int" => Some(SchemaType::Integer),
            "boolean" | "bool" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }

    /// Returns true for `array` and `object`.
    pub fn is_container(&self) -> bool {
        matches!(self, SchemaType::Array | SchemaType::Object)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema-level header carried by the meta line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Opaque identifier, also the root namespace of implicit bindings.
    pub id: String,
    /// Schema dialect, passed through verbatim.
    pub version: String,
    pub direction: Direction,
}

impl Meta {
    pub fn new(id: impl Into<String>, version: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            direction,
        }
    }
}

/// One field declaration.
///
/// Keywords the algorithms never interpret (`title`, `description`,
/// `pattern`, `minimum`, ...) live in `extra` as raw text and are copied
/// through to every artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub fullname: String,
    #[serde(rename = "type", default)]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_names: Vec<String>,
    #[serde(rename = "const", default, skip_serializing_if = "Vec::is_empty")]
    pub const_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<String>,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Item {
    pub fn new(fullname: impl Into<String>) -> Self {
        Self {
            fullname: fullname.into(),
            ..Self::default()
        }
    }

    /// Looks up a passthrough keyword such as `title` or `maxLength`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    pub fn segments(&self) -> Vec<path::Segment> {
        path::split_segments(&self.fullname)
    }

    /// True when `src` or `dst` is a literal template rather than a path.
    pub fn is_template(&self) -> bool {
        is_template(&self.src) || is_template(&self.dst)
    }
}

pub(crate) fn is_template(binding: &str) -> bool {
    binding.starts_with("{{")
}

/// A parsed lineschema: one header plus its ordered field declarations.
/// Immutable once built; artifacts are derived, never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jsonschemaline {
    pub meta: Meta,
    pub items: Vec<Item>,
}

impl Jsonschemaline {
    pub fn new(meta: Meta, items: Vec<Item>) -> Self {
        Self { meta, items }
    }

    /// Finds the last declaration of `fullname`.
    pub fn item(&self, fullname: &str) -> Option<&Item> {
        self.items.iter().rev().find(|item| item.fullname == fullname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("in"), Some(Direction::In));
        assert_eq!(Direction::parse("out"), Some(Direction::Out));
        assert_eq!(Direction::parse("convert"), Some(Direction::Convert));
        assert_eq!(Direction::parse("sideways"), None);
        assert_eq!(Direction::Out.to_string(), "out");
    }

    #[test]
    fn test_schema_type_shorthands() {
        assert_eq!(SchemaType::parse("int"), Some(SchemaType::Integer));
        assert_eq!(SchemaType::parse("bool"), Some(SchemaType::Boolean));
        assert_eq!(SchemaType::parse("timestamp"), None);
        assert_eq!(SchemaType::default(), SchemaType::String);
        assert!(SchemaType::Array.is_container());
        assert!(!SchemaType::Number.is_container());
    }

    #[test]
    fn test_item_serde_names() {
        let mut item = Item::new("config.status");
        item.enum_values = vec!["0".into(), "1".into()];
        item.required = true;
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["fullname"], "config.status");
        assert_eq!(v["type"], "string");
        assert_eq!(v["enum"], serde_json::json!(["0", "1"]));
        assert_eq!(v["required"], true);
        let back: Item = serde_json::from_value(v).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_template_detection() {
        let mut item = Item::new("x");
        item.src = "{{getSetValue . \"a\" \"b\"}}".into();
        assert!(item.is_template());
        item.src = "input.x".into();
        assert!(!item.is_template());
    }

    #[test]
    fn test_last_declaration_wins_lookup() {
        let mut first = Item::new("a");
        first.format = Some("int".into());
        let mut second = Item::new("a");
        second.format = Some("float".into());
        let line = Jsonschemaline::new(
            Meta::new("root", DEFAULT_VERSION, Direction::In),
            vec![first, second],
        );
        assert_eq!(line.item("a").unwrap().format.as_deref(), Some("float"));
        assert!(line.item("b").is_none());
    }
}
