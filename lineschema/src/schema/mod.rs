/// Item list <-> JSON Schema document.
///
/// `to_json` builds the nested tree from flat fullnames, `from_json`
/// flattens a document back into items. `required` always lives in the
/// nearest enclosing object's `required` array.
pub mod from_json;
pub mod to_json;

pub use from_json::{from_json_schema, from_json_schema_str};
pub use to_json::to_json_schema;

use serde_json::Value;

use crate::ast::SchemaType;

/// Keywords written as JSON numbers when their raw text is numeric.
pub const NUMERIC_KEYWORDS: [&str; 11] = [
    "multipleOf",
    "maximum",
    "minimum",
    "maxLength",
    "minLength",
    "maxItems",
    "minItems",
    "maxContains",
    "minContains",
    "maxProperties",
    "minProperties",
];

/// Keywords written as JSON booleans when their raw text is `true`/`false`.
pub const FLAG_KEYWORDS: [&str; 7] = [
    "exclusiveMaximum",
    "exclusiveMinimum",
    "deprecated",
    "readOnly",
    "writeOnly",
    "uniqueItems",
    "allowEmptyValue",
];

/// Keywords owned by the tree shape itself; never copied from or into items.
const STRUCTURAL_KEYWORDS: [&str; 6] =
    ["type", "properties", "items", "required", "$schema", "$id"];

fn is_structural(key: &str) -> bool {
    STRUCTURAL_KEYWORDS.contains(&key)
}

fn parse_number(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(raw).ok().filter(Value::is_number)
}

/// A raw value typed after the field's declared type (`enum`, `const`,
/// `default`, `example`).
fn typed_value(schema_type: SchemaType, raw: &str) -> Value {
    let typed = match schema_type {
        SchemaType::Number | SchemaType::Integer => parse_number(raw),
        SchemaType::Boolean => raw.parse::<bool>().ok().map(Value::Bool),
        _ => None,
    };
    typed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// A passthrough keyword typed after the keyword's own meaning.
fn keyword_value(key: &str, raw: &str) -> Value {
    let typed = if NUMERIC_KEYWORDS.contains(&key) {
        parse_number(raw)
    } else if FLAG_KEYWORDS.contains(&key) {
        raw.parse::<bool>().ok().map(Value::Bool)
    } else {
        None
    };
    typed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Inverse of the typing above: strings verbatim, everything else as JSON text.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
