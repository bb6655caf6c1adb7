/// Line serialization: `Jsonschemaline` -> lineschema text.
///
/// Key order is an explicit `FieldOrder` policy handed to the writer.
/// Keys the policy does not name follow in lexical order.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ast::{Direction, Item, Jsonschemaline, SchemaType};
use crate::parser::{escape_value, implied_binding};

const CANONICAL_ORDER: [&str; 34] = [
    "fullname",
    "src",
    "dst",
    "type",
    "format",
    "pattern",
    "enum",
    "required",
    "allowEmptyValue",
    "title",
    "description",
    "default",
    "comment",
    "example",
    "deprecated",
    "const",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxContains",
    "minContains",
    "maxProperties",
    "minProperties",
    "contentEncoding",
    "contentMediaType",
    "readOnly",
    "writeOnly",
];

/// Ordering policy for the keys of an item line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrder {
    keys: Vec<String>,
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self::new(CANONICAL_ORDER)
    }
}

impl FieldOrder {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn rank(&self, key: &str) -> usize {
        self.keys
            .iter()
            .position(|k| k == key)
            .unwrap_or(self.keys.len())
    }
}

/// Builds lineschema text one `key=value` pair at a time.
pub struct LineWriter {
    buf: String,
    line_open: bool,
}

impl Default for LineWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            line_open: false,
        }
    }

    /// Write `key=value`, or a bare `key` when the value is `true`.
    pub fn pair(&mut self, key: &str, value: &str) {
        self.separate();
        self.buf.push_str(key);
        if value != "true" {
            self.buf.push('=');
            self.buf.push_str(&escape_value(value));
        }
    }

    /// Write `key=text` with `text` taken verbatim.
    pub fn literal(&mut self, key: &str, text: &str) {
        self.separate();
        self.buf.push_str(key);
        self.buf.push('=');
        self.buf.push_str(text);
    }

    /// Terminate the current line.
    pub fn end_line(&mut self) {
        if self.line_open {
            self.buf.push('\n');
            self.line_open = false;
        }
    }

    /// Consume and return the built text without a trailing newline.
    pub fn finish(mut self) -> String {
        self.end_line();
        if self.buf.ends_with('\n') {
            self.buf.pop();
        }
        self.buf
    }

    fn separate(&mut self) {
        if self.line_open {
            self.buf.push(',');
        }
        self.line_open = true;
    }
}

impl Jsonschemaline {
    /// Serialize back to lineschema text. Parsing the result yields a value
    /// equal to `self`.
    pub fn to_lineschema(&self, order: &FieldOrder) -> String {
        let mut w = LineWriter::new();
        w.pair("version", &self.meta.version);
        w.pair("direction", self.meta.direction.as_str());
        w.pair("id", &self.meta.id);
        w.end_line();
        for item in &self.items {
            for (key, value) in item_pairs(item, &self.meta.id, self.meta.direction, order) {
                match value {
                    PairValue::Text(text) => w.pair(key, text),
                    PairValue::Literal(text) => w.literal(key, &text),
                }
            }
            w.end_line();
        }
        w.finish()
    }
}

enum PairValue<'a> {
    Text(&'a str),
    /// A bracketed JSON list, written unescaped.
    Literal(String),
}

/// The pairs of one item line, sorted by `order`.
fn item_pairs<'a>(
    item: &'a Item,
    id: &str,
    direction: Direction,
    order: &FieldOrder,
) -> Vec<(&'a str, PairValue<'a>)> {
    let mut pairs: Vec<(&str, &str)> = vec![("fullname", item.fullname.as_str())];
    let mut literals: Vec<(&str, PairValue)> = Vec::new();

    let implied = implied_binding(id, &item.fullname);
    let mut write_src = item.src != implied;
    let mut write_dst = item.dst != implied;
    if !write_src && !write_dst {
        match direction {
            Direction::Out => write_src = true,
            Direction::In | Direction::Convert => write_dst = true,
        }
    }
    if write_src {
        pairs.push(("src", item.src.as_str()));
    }
    if write_dst {
        pairs.push(("dst", item.dst.as_str()));
    }

    if item.schema_type != SchemaType::String {
        pairs.push(("type", item.schema_type.as_str()));
    }
    if let Some(format) = &item.format {
        pairs.push(("format", format.as_str()));
    }
    if item.required {
        pairs.push(("required", "true"));
    }
    for (key, values) in [
        ("enum", &item.enum_values),
        ("enumNames", &item.enum_names),
        ("const", &item.const_values),
    ] {
        // `key=[..` would reopen a list literal on parse.
        if values.iter().any(|v| v.starts_with('[')) {
            literals.push((key, PairValue::Literal(Value::from(values.clone()).to_string())));
        } else {
            pairs.extend(values.iter().map(|v| (key, v.as_str())));
        }
    }
    for (key, value) in [
        ("default", &item.default),
        ("example", &item.example),
        ("examples", &item.examples),
    ] {
        if let Some(value) = value {
            pairs.push((key, value.as_str()));
        }
    }
    pairs.extend(item.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let mut pairs: Vec<(&str, PairValue)> = pairs
        .into_iter()
        .map(|(k, v)| (k, PairValue::Text(v)))
        .chain(literals)
        .collect();
    // Stable: repeated list keys keep their relative order.
    pairs.sort_by(|a, b| {
        order
            .rank(a.0)
            .cmp(&order.rank(b.0))
            .then_with(|| a.0.cmp(b.0))
    });
    pairs
}
