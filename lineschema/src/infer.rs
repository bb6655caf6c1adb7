/// Lineschema inference from a sample JSON document.
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::ast::{Direction, Item, Jsonschemaline, Meta, DEFAULT_ID, DEFAULT_VERSION};
use crate::error::ConversionError;
use crate::parser::fill_bindings;
use crate::path;

pub fn from_example_str(text: &str) -> Result<Jsonschemaline, ConversionError> {
    let sample: Value = serde_json::from_str(text)?;
    Ok(from_example(&sample))
}

/// Derive an `in` schema with one item per distinct leaf of `sample`.
/// Array elements merge into a single `[]` path; the first sample value
/// seen for a path becomes its `example`.
pub fn from_example(sample: &Value) -> Jsonschemaline {
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    walk(sample, "", &mut items, &mut seen);
    for item in &mut items {
        item.dst = item.fullname.clone();
        fill_bindings(item, DEFAULT_ID);
    }
    debug!(items = items.len(), "inferred lineschema from example");
    Jsonschemaline::new(Meta::new(DEFAULT_ID, DEFAULT_VERSION, Direction::In), items)
}

fn walk(value: &Value, fullname: &str, items: &mut Vec<Item>, seen: &mut HashSet<String>) {
    let format = match value {
        Value::Null => return,
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, &path::join(fullname, key), items, seen);
            }
            return;
        }
        Value::Array(elements) => {
            let elem = format!("{fullname}{}", path::ARRAY_SUFFIX);
            for child in elements {
                walk(child, &elem, items, seen);
            }
            return;
        }
        Value::String(_) => None,
        Value::Number(_) => Some("number"),
        Value::Bool(_) => Some("bool"),
    };
    if fullname.is_empty() || !seen.insert(fullname.to_string()) {
        return;
    }
    let mut item = Item::new(fullname);
    item.format = format.map(str::to_string);
    item.example = Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    items.push(item);
}
