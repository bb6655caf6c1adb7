/// Forward conversion: flat item list -> nested JSON Schema.
///
/// Nodes live in an arena keyed by their canonical fullname prefix
/// (`items`, `items[]`, `items[].id`, ...). Every item walks its segments
/// and reuses the nodes earlier items created, so siblings sharing a
/// prefix merge into one subtree. A node is never retyped: asking for an
/// object where an array or scalar already sits is a `KindConflict`.
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

use super::{is_structural, keyword_value, typed_value};
use crate::ast::{Item, Jsonschemaline, SchemaType};
use crate::error::ConversionError;
use crate::path;

const ROOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Object,
    Array,
    Scalar,
}

impl Kind {
    fn of(schema_type: SchemaType) -> Kind {
        match schema_type {
            SchemaType::Object => Kind::Object,
            SchemaType::Array => Kind::Array,
            _ => Kind::Scalar,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Scalar => "scalar",
        }
    }
}

#[derive(Debug)]
struct SchemaNode {
    kind: Kind,
    schema_type: SchemaType,
    attrs: Map<String, Value>,
    required: Vec<String>,
    properties: Vec<(String, usize)>,
    items: Option<usize>,
}

impl SchemaNode {
    fn new(kind: Kind, schema_type: SchemaType) -> Self {
        Self {
            kind,
            schema_type,
            attrs: Map::new(),
            required: Vec::new(),
            properties: Vec::new(),
            items: None,
        }
    }

    fn container(kind: Kind) -> Self {
        let schema_type = match kind {
            Kind::Array => SchemaType::Array,
            _ => SchemaType::Object,
        };
        Self::new(kind, schema_type)
    }

    fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.items.is_none()
    }
}

struct TreeBuilder {
    nodes: Vec<SchemaNode>,
    index: HashMap<String, usize>,
}

impl TreeBuilder {
    fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(String::new(), ROOT);
        Self {
            nodes: vec![SchemaNode::container(Kind::Object)],
            index,
        }
    }

    fn insert(&mut self, item: &Item) -> Result<(), ConversionError> {
        let segments = item.segments();
        let Some(last) = segments.len().checked_sub(1) else {
            trace!(fullname = %item.fullname, "skipping item without segments");
            return Ok(());
        };

        let mut parent = ROOT;
        let mut parent_path = String::new();
        for (i, seg) in segments.iter().enumerate() {
            let is_leaf = i == last;
            let leaf_kind = Kind::of(item.schema_type);

            // A nameless `[]` hop makes the current container itself the array.
            let (node, node_path) = if seg.name.is_empty() {
                (parent, parent_path.clone())
            } else {
                let kind = match (seg.is_array, is_leaf) {
                    (true, _) => Kind::Array,
                    (false, true) => leaf_kind,
                    (false, false) => Kind::Object,
                };
                let node_path = path::join(&parent_path, &seg.name);
                let node = self.child(parent, &parent_path, &seg.name, &node_path, kind)?;
                if is_leaf && item.required {
                    let required = &mut self.nodes[parent].required;
                    if !required.contains(&seg.name) {
                        required.push(seg.name.clone());
                    }
                }
                (node, node_path)
            };

            let (target, target_path) = if seg.is_array {
                self.ensure_kind(node, &node_path, Kind::Array)?;
                let elem_kind = if is_leaf { leaf_kind } else { Kind::Object };
                let elem_path = format!("{node_path}{}", path::ARRAY_SUFFIX);
                (self.element(node, &elem_path, elem_kind)?, elem_path)
            } else {
                (node, node_path)
            };

            if is_leaf {
                let leaf = &mut self.nodes[target];
                leaf.schema_type = item.schema_type;
                leaf.attrs.extend(leaf_attributes(item));
            } else {
                parent = target;
                parent_path = target_path;
            }
        }
        Ok(())
    }

    /// Named property `name` of the object at `parent`.
    fn child(
        &mut self,
        parent: usize,
        parent_path: &str,
        name: &str,
        node_path: &str,
        kind: Kind,
    ) -> Result<usize, ConversionError> {
        if let Some(&idx) = self.index.get(node_path) {
            self.ensure_kind(idx, node_path, kind)?;
            return Ok(idx);
        }
        self.ensure_kind(parent, parent_path, Kind::Object)?;
        let idx = self.push(node_path, SchemaNode::container(kind));
        self.nodes[parent].properties.push((name.to_string(), idx));
        Ok(idx)
    }

    /// Element schema of the array at `array`.
    fn element(
        &mut self,
        array: usize,
        elem_path: &str,
        kind: Kind,
    ) -> Result<usize, ConversionError> {
        if let Some(idx) = self.nodes[array].items {
            self.ensure_kind(idx, elem_path, kind)?;
            return Ok(idx);
        }
        let idx = self.push(elem_path, SchemaNode::container(kind));
        self.nodes[array].items = Some(idx);
        Ok(idx)
    }

    fn push(&mut self, node_path: &str, node: SchemaNode) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node_path.to_string(), idx);
        idx
    }

    /// Only a still-empty root may change kind.
    fn ensure_kind(
        &mut self,
        idx: usize,
        node_path: &str,
        kind: Kind,
    ) -> Result<(), ConversionError> {
        let node = &mut self.nodes[idx];
        if node.kind == kind {
            return Ok(());
        }
        if idx == ROOT && node.is_empty() && kind != Kind::Scalar {
            *node = SchemaNode::container(kind);
            return Ok(());
        }
        Err(ConversionError::KindConflict {
            path: node_path.to_string(),
            existing: node.kind.as_str(),
            requested: kind.as_str(),
        })
    }

    fn render(&self, idx: usize) -> Value {
        let node = &self.nodes[idx];
        let mut out = node.attrs.clone();
        out.insert("type".into(), Value::String(node.schema_type.as_str().into()));
        match node.kind {
            Kind::Object => {
                if !node.required.is_empty() {
                    let required = node.required.iter().cloned().map(Value::String).collect();
                    out.insert("required".into(), Value::Array(required));
                }
                if !node.properties.is_empty() {
                    let properties = node
                        .properties
                        .iter()
                        .map(|(name, child)| (name.clone(), self.render(*child)))
                        .collect();
                    out.insert("properties".into(), Value::Object(properties));
                }
            }
            Kind::Array => {
                if let Some(items) = node.items {
                    out.insert("items".into(), self.render(items));
                }
            }
            Kind::Scalar => {}
        }
        Value::Object(out)
    }
}

/// The JSON Schema keywords an item contributes to its own node.
fn leaf_attributes(item: &Item) -> Map<String, Value> {
    let mut attrs = Map::new();
    let typed = |raw: &String| typed_value(item.schema_type, raw);

    if let Some(format) = &item.format {
        attrs.insert("format".into(), Value::String(format.clone()));
    }
    if !item.enum_values.is_empty() {
        if item.enum_names.is_empty() {
            let values = item.enum_values.iter().map(typed).collect();
            attrs.insert("enum".into(), Value::Array(values));
        } else {
            // Extra values or names beyond the shorter list are dropped.
            let one_of = item
                .enum_values
                .iter()
                .zip(&item.enum_names)
                .map(|(value, title)| {
                    let mut entry = Map::new();
                    entry.insert("const".into(), typed(value));
                    entry.insert("title".into(), Value::String(title.clone()));
                    Value::Object(entry)
                })
                .collect();
            attrs.insert("oneOf".into(), Value::Array(one_of));
        }
    }
    match item.const_values.as_slice() {
        [] => {}
        [single] => {
            attrs.insert("const".into(), typed(single));
        }
        many => {
            attrs.insert("const".into(), Value::Array(many.iter().map(typed).collect()));
        }
    }
    if let Some(default) = &item.default {
        attrs.insert("default".into(), typed(default));
    }
    if let Some(example) = &item.example {
        attrs.insert("example".into(), typed(example));
    }
    if let Some(examples) = &item.examples {
        let value = match serde_json::from_str::<Value>(examples) {
            Ok(list @ Value::Array(_)) => list,
            _ => Value::Array(vec![Value::String(examples.clone())]),
        };
        attrs.insert("examples".into(), value);
    }
    for (key, raw) in &item.extra {
        if is_structural(key) {
            trace!(key = %key, fullname = %item.fullname, "structural keyword ignored");
            continue;
        }
        attrs.insert(key.clone(), keyword_value(key, raw));
    }
    attrs
}

/// Build the JSON Schema document for `items`, tagged with `version` as
/// its `$schema`.
pub fn to_json_schema(version: &str, items: &[Item]) -> Result<Value, ConversionError> {
    let mut builder = TreeBuilder::new();
    for item in items {
        builder.insert(item)?;
    }
    let mut root = match builder.render(ROOT) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    root.insert("$schema".into(), Value::String(version.to_string()));
    debug!(
        items = items.len(),
        nodes = builder.nodes.len(),
        "built json schema"
    );
    Ok(Value::Object(root))
}

impl Jsonschemaline {
    /// JSON Schema for this document, `$schema` taken from `meta.version`.
    pub fn to_json_schema(&self) -> Result<Value, ConversionError> {
        to_json_schema(&self.meta.version, &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DEFAULT_VERSION;
    use serde_json::json;

    fn item(fullname: &str) -> Item {
        Item::new(fullname)
    }

    #[test]
    fn test_array_of_objects() {
        let mut id = item("items[].id");
        id.required = true;
        let schema = to_json_schema("v1", &[id]).unwrap();
        assert_eq!(
            schema,
            json!({
                "$schema": "v1",
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["id"],
                            "properties": {"id": {"type": "string"}}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_siblings_share_scaffolding() {
        let mut total = item("pageInfo.total");
        total.schema_type = SchemaType::Integer;
        total.required = true;
        let mut index = item("pageInfo.index");
        index.schema_type = SchemaType::Integer;
        index.required = true;
        let schema = to_json_schema(DEFAULT_VERSION, &[total, index]).unwrap();
        let page_info = &schema["properties"]["pageInfo"];
        assert_eq!(page_info["required"], json!(["total", "index"]));
        assert_eq!(page_info["properties"]["total"], json!({"type": "integer"}));
        assert_eq!(page_info["properties"]["index"], json!({"type": "integer"}));
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_array_leaf_required_lands_on_parent() {
        let mut tags = item("tags[]");
        tags.required = true;
        tags.schema_type = SchemaType::Integer;
        let schema = to_json_schema("v1", &[tags]).unwrap();
        assert_eq!(schema["required"], json!(["tags"]));
        assert_eq!(
            schema["properties"]["tags"],
            json!({"type": "array", "items": {"type": "integer"}})
        );
    }

    #[test]
    fn test_enum_names_become_one_of() {
        let mut status = item("status");
        status.schema_type = SchemaType::Integer;
        status.enum_values = vec!["0".into(), "1".into(), "2".into()];
        status.enum_names = vec!["off".into(), "on".into()];
        let schema = to_json_schema("v1", &[status]).unwrap();
        assert_eq!(
            schema["properties"]["status"]["oneOf"],
            json!([{"const": 0, "title": "off"}, {"const": 1, "title": "on"}])
        );
        assert!(schema["properties"]["status"].get("enum").is_none());
    }

    #[test]
    fn test_leaf_attribute_typing() {
        let mut name = item("name");
        name.enum_values = vec!["a".into(), "b".into()];
        name.const_values = vec!["a".into()];
        name.default = Some("a".into());
        name.examples = Some("a".into());
        name.extra.insert("maxLength".into(), "10".into());
        name.extra.insert("deprecated".into(), "true".into());
        name.extra.insert("title".into(), "Name".into());
        name.extra.insert("type".into(), "bogus".into());
        let schema = to_json_schema("v1", &[name]).unwrap();
        assert_eq!(
            schema["properties"]["name"],
            json!({
                "type": "string",
                "enum": ["a", "b"],
                "const": "a",
                "default": "a",
                "examples": ["a"],
                "maxLength": 10,
                "deprecated": true,
                "title": "Name"
            })
        );
    }

    #[test]
    fn test_const_list() {
        let mut code = item("code");
        code.schema_type = SchemaType::Number;
        code.const_values = vec!["1".into(), "2".into()];
        let schema = to_json_schema("v1", &[code]).unwrap();
        assert_eq!(schema["properties"]["code"]["const"], json!([1, 2]));
    }

    #[test]
    fn test_root_array() {
        let schema = to_json_schema("v1", &[item("[]._param"), item("[].id")]).unwrap();
        assert_eq!(schema["type"], "array");
        assert_eq!(
            schema["items"]["properties"],
            json!({"_param": {"type": "string"}, "id": {"type": "string"}})
        );
    }

    #[test]
    fn test_explicit_container_then_children() {
        let mut config = item("config");
        config.schema_type = SchemaType::Object;
        config.extra.insert("title".into(), "Config".into());
        let schema = to_json_schema("v1", &[config, item("config.name")]).unwrap();
        assert_eq!(
            schema["properties"]["config"],
            json!({
                "type": "object",
                "title": "Config",
                "properties": {"name": {"type": "string"}}
            })
        );
    }

    #[test]
    fn test_kind_conflict() {
        let err = to_json_schema("v1", &[item("a"), item("a.b")]).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::KindConflict { ref path, existing: "scalar", requested: "object" }
                if path == "a"
        ));

        let mut list = item("a");
        list.schema_type = SchemaType::Array;
        let err = to_json_schema("v1", &[item("a.b"), list]).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::KindConflict { existing: "object", requested: "array", .. }
        ));

        let err = to_json_schema("v1", &[item("x"), item("[].y")]).unwrap_err();
        assert!(matches!(err, ConversionError::KindConflict { .. }));
    }

    #[test]
    fn test_last_declaration_wins() {
        let mut first = item("n");
        first.schema_type = SchemaType::Integer;
        first.extra.insert("title".into(), "first".into());
        let mut second = item("n");
        second.schema_type = SchemaType::Number;
        second.extra.insert("title".into(), "second".into());
        let schema = to_json_schema("v1", &[first, second]).unwrap();
        assert_eq!(
            schema["properties"]["n"],
            json!({"type": "number", "title": "second"})
        );
    }

    #[test]
    fn test_empty_items() {
        let schema = to_json_schema("v1", &[]).unwrap();
        assert_eq!(schema, json!({"$schema": "v1", "type": "object"}));
        assert_eq!(schema.as_object().unwrap().keys().next().unwrap(), "$schema");
    }
}
