/// Reverse conversion: JSON Schema document -> `Jsonschemaline`.
///
/// The document is walked depth first. `properties.<name>` hops become
/// `.name` segments, `items` hops become a trailing `[]`, and a parent's
/// `required: [..]` array becomes the `required` flag of the matching
/// child item.
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::{is_structural, value_text};
use crate::ast::{Direction, Item, Jsonschemaline, Meta, SchemaType, DEFAULT_ID, DEFAULT_VERSION};
use crate::error::ConversionError;
use crate::parser::fill_bindings;
use crate::path;

/// Parse and convert a JSON Schema given as text.
pub fn from_json_schema_str(text: &str) -> Result<Jsonschemaline, ConversionError> {
    let schema: Value = serde_json::from_str(text)?;
    from_json_schema(&schema)
}

/// Convert a JSON Schema document into an `in` lineschema. `$id` names the
/// schema and `$schema` becomes its version; `dst` is each item's fullname.
pub fn from_json_schema(schema: &Value) -> Result<Jsonschemaline, ConversionError> {
    let root = as_schema(schema, "")?;
    let version = root
        .get("$schema")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_VERSION);
    let id = root
        .get("$id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_ID);

    let mut items = Vec::new();
    visit(root, "", false, &mut items)?;
    for item in &mut items {
        item.dst = item.fullname.clone();
        fill_bindings(item, id);
    }
    debug!(id, items = items.len(), "flattened json schema");
    Ok(Jsonschemaline::new(Meta::new(id, version, Direction::In), items))
}

fn location(fullname: &str) -> String {
    if fullname.is_empty() {
        "#".to_string()
    } else {
        fullname.to_string()
    }
}

fn as_schema<'a>(
    value: &'a Value,
    fullname: &str,
) -> Result<&'a Map<String, Value>, ConversionError> {
    value.as_object().ok_or_else(|| ConversionError::NotAnObject {
        path: location(fullname),
    })
}

fn visit(
    schema: &Map<String, Value>,
    fullname: &str,
    required: bool,
    out: &mut Vec<Item>,
) -> Result<(), ConversionError> {
    let schema_type = node_type(schema, fullname)?;
    let own_attrs = schema.keys().any(|k| !is_structural(k));
    let named = !fullname.is_empty();

    match schema_type {
        SchemaType::Object => {
            let required_names = required_names(schema, fullname)?;
            let properties = match schema.get("properties") {
                None => None,
                Some(props) => Some(as_schema(props, fullname)?),
            };
            let has_properties = properties.is_some_and(|p| !p.is_empty());
            if named && (own_attrs || required || !has_properties) {
                out.push(item_from(schema, fullname, schema_type, required));
            }
            for (name, child) in properties.into_iter().flatten() {
                let child_name = path::join(fullname, name);
                let child = as_schema(child, &child_name)?;
                visit(child, &child_name, required_names.contains(&name.as_str()), out)?;
            }
        }
        SchemaType::Array => {
            let elem_name = format!("{fullname}{}", path::ARRAY_SUFFIX);
            let Some(elem) = schema.get("items") else {
                if named {
                    out.push(item_from(schema, fullname, schema_type, required));
                }
                return Ok(());
            };
            let elem = as_schema(elem, &elem_name)?;
            if !own_attrs {
                // A bare array is written as its element: `tags[]` or
                // `list[]` carries the array's required flag.
                visit(elem, &elem_name, required, out)?;
            } else {
                if named {
                    out.push(item_from(schema, fullname, schema_type, required));
                }
                visit(elem, &elem_name, false, out)?;
            }
        }
        _ if !named => trace!("scalar root schema has no fields"),
        _ => out.push(item_from(schema, fullname, schema_type, required)),
    }
    Ok(())
}

fn node_type(schema: &Map<String, Value>, fullname: &str) -> Result<SchemaType, ConversionError> {
    match schema.get("type") {
        Some(Value::String(s)) => SchemaType::parse(s).ok_or_else(|| ConversionError::UnknownType {
            path: location(fullname),
            got: s.clone(),
        }),
        Some(other) => Err(ConversionError::UnknownType {
            path: location(fullname),
            got: other.to_string(),
        }),
        None if schema.contains_key("properties") => Ok(SchemaType::Object),
        None if schema.contains_key("items") => Ok(SchemaType::Array),
        None => Ok(SchemaType::String),
    }
}

/// Names listed in an object's `required` array. A boolean `required` is
/// the node's own flag and lists nobody.
fn required_names<'a>(
    schema: &'a Map<String, Value>,
    fullname: &str,
) -> Result<Vec<&'a str>, ConversionError> {
    let invalid = || ConversionError::InvalidRequired {
        path: location(fullname),
    };
    match schema.get("required") {
        None | Some(Value::Bool(_)) => Ok(Vec::new()),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| name.as_str().ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

fn item_from(
    schema: &Map<String, Value>,
    fullname: &str,
    schema_type: SchemaType,
    required: bool,
) -> Item {
    let mut item = Item::new(fullname);
    item.schema_type = schema_type;
    item.required = required || schema.get("required") == Some(&Value::Bool(true));
    for (key, value) in schema {
        match key.as_str() {
            k if is_structural(k) => {}
            "format" => item.format = Some(value_text(value)),
            "enum" => item.enum_values = text_list(value),
            "const" => item.const_values = text_list(value),
            "default" => item.default = Some(value_text(value)),
            "example" => item.example = Some(value_text(value)),
            "examples" => item.examples = Some(examples_text(value)),
            "oneOf" => match one_of_consts(value) {
                Some((values, names)) => {
                    item.enum_values = values;
                    item.enum_names = names;
                }
                None => {
                    item.extra.insert(key.clone(), value_text(value));
                }
            },
            other => {
                item.extra.insert(other.to_string(), value_text(value));
            }
        }
    }
    item
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().map(value_text).collect(),
        single => vec![value_text(single)],
    }
}

/// A single-element `examples` array reads back as its only element.
fn examples_text(value: &Value) -> String {
    match value.as_array().map(Vec::as_slice) {
        Some([only]) => value_text(only),
        _ => value_text(value),
    }
}

/// `oneOf: [{const, title}, ..]` -> (`enum`, `enumNames`). Names are kept
/// only when every entry carries a title.
fn one_of_consts(value: &Value) -> Option<(Vec<String>, Vec<String>)> {
    let entries = value.as_array()?;
    let mut values = Vec::with_capacity(entries.len());
    let mut names = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.as_object()?;
        values.push(value_text(entry.get("const")?));
        if let Some(title) = entry.get("title") {
            names.push(value_text(title));
        }
    }
    if names.len() != values.len() {
        names.clear();
    }
    Some((values, names))
}
