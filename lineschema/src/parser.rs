/// Lineschema parser: text -> `Jsonschemaline`.
///
/// Each non-empty line is a comma-separated list of `key=value` pairs.
/// `\,` and `\\` escape a comma or backslash inside a value. A bare `key`
/// means `key=true`.
/// A line carrying `id` but no `fullname` is the meta line; every other
/// line declares one item. `enum`, `enumNames` and `const` accumulate when
/// repeated and also accept a bracketed JSON array (`enum=["a","b"]`),
/// which is expanded into the repeated form before tokenizing.
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::ast::{Direction, Item, Jsonschemaline, Meta, SchemaType};
use crate::error::ParseError;
use crate::path;

/// Keys whose repeated occurrences accumulate into a list.
const LIST_KEYS: [&str; 3] = ["enumNames", "enum", "const"];

/// Parse a single schema. Blank lines are ignored.
pub fn parse(text: &str) -> Result<Jsonschemaline, ParseError> {
    let lines: Vec<(usize, &str)> = text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();
    parse_block(&lines)
}

/// Parse several schemas separated by blank lines.
pub fn parse_many(text: &str) -> Result<Vec<Jsonschemaline>, ParseError> {
    let mut schemas = Vec::new();
    let mut block = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                schemas.push(parse_block(&block)?);
                block.clear();
            }
            continue;
        }
        block.push((idx + 1, line));
    }
    if !block.is_empty() {
        schemas.push(parse_block(&block)?);
    }
    debug!(schemas = schemas.len(), "parsed multi-schema input");
    Ok(schemas)
}

impl FromStr for Jsonschemaline {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

enum Line {
    Meta(Meta),
    Item(Item),
}

fn parse_block(lines: &[(usize, &str)]) -> Result<Jsonschemaline, ParseError> {
    let first_line = lines.first().map_or(1, |(n, _)| *n);
    let mut meta = None;
    let mut items = Vec::new();

    for &(line_no, raw) in lines {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match parse_line(raw, line_no)? {
            Line::Meta(m) => {
                if meta.is_some() {
                    return Err(ParseError::DuplicateMeta { line: line_no });
                }
                meta = Some(m);
            }
            Line::Item(item) => items.push(item),
        }
    }

    let meta = meta.ok_or(ParseError::MissingMeta { line: first_line })?;
    for item in &mut items {
        fill_bindings(item, &meta.id);
    }
    debug!(
        id = %meta.id,
        direction = %meta.direction,
        items = items.len(),
        "parsed lineschema"
    );
    Ok(Jsonschemaline::new(meta, items))
}

/// `{id}.{fullname}` with array hops written positionally.
pub(crate) fn implied_binding(id: &str, fullname: &str) -> String {
    let gjson = path::to_gjson_style(fullname);
    match (id.is_empty(), gjson.is_empty()) {
        (true, _) => gjson,
        (false, true) => id.to_string(),
        (false, false) => format!("{id}.{gjson}"),
    }
}

/// Fills whichever of `src`/`dst` the line left out.
pub(crate) fn fill_bindings(item: &mut Item, id: &str) {
    if item.src.is_empty() {
        item.src = implied_binding(id, &item.fullname);
    }
    if item.dst.is_empty() {
        item.dst = implied_binding(id, &item.fullname);
    }
}

fn parse_line(raw: &str, line_no: usize) -> Result<Line, ParseError> {
    let expanded = expand_list_literals(raw, line_no)?;
    let pairs = tokenize(&expanded, line_no)?;
    let has_id = pairs.iter().any(|(k, _)| k == "id");
    let has_fullname = pairs.iter().any(|(k, _)| k == "fullname");
    if has_id && !has_fullname {
        meta_from_pairs(&pairs, line_no).map(Line::Meta)
    } else {
        item_from_pairs(pairs, line_no).map(Line::Item)
    }
}

fn meta_from_pairs(pairs: &[(String, String)], line_no: usize) -> Result<Meta, ParseError> {
    let mut id = "";
    let mut version = "";
    let mut direction = None;
    for (key, value) in pairs {
        match key.as_str() {
            "id" => id = value.as_str(),
            "version" => version = value.as_str(),
            "direction" => direction = Some(value.as_str()),
            other => trace!(key = other, line = line_no, "ignoring meta key"),
        }
    }
    if id.is_empty() {
        return Err(ParseError::MissingMetaField {
            line: line_no,
            field: "id",
        });
    }
    if version.is_empty() {
        return Err(ParseError::MissingMetaField {
            line: line_no,
            field: "version",
        });
    }
    let direction = direction
        .and_then(Direction::parse)
        .ok_or_else(|| ParseError::InvalidDirection {
            line: line_no,
            got: direction.unwrap_or_default().to_string(),
        })?;
    Ok(Meta::new(id, version, direction))
}

fn item_from_pairs(pairs: Vec<(String, String)>, line_no: usize) -> Result<Item, ParseError> {
    let mut item = Item::default();
    for (key, value) in pairs {
        match key.as_str() {
            "fullname" => item.fullname = value,
            "type" => {
                item.schema_type =
                    SchemaType::parse(&value).ok_or_else(|| ParseError::UnknownType {
                        line: line_no,
                        got: value.clone(),
                    })?
            }
            "format" => item.format = Some(value),
            "required" => item.required = parse_flag(&key, &value, line_no)?,
            "enum" => item.enum_values.push(value),
            "enumNames" => item.enum_names.push(value),
            "const" => item.const_values.push(value),
            "default" => item.default = Some(value),
            "example" => item.example = Some(value),
            "examples" => item.examples = Some(value),
            "src" => item.src = value,
            "dst" => item.dst = value,
            other => {
                item.extra.insert(other.to_string(), value);
            }
        }
    }

    if item.fullname.is_empty() {
        return Err(ParseError::MissingFullname { line: line_no });
    }
    if item.src.is_empty() && item.dst.is_empty() {
        return Err(ParseError::MissingBinding {
            line: line_no,
            fullname: item.fullname,
        });
    }
    Ok(item)
}

fn parse_flag(key: &str, value: &str, line_no: usize) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidFlag {
            line: line_no,
            key: key.to_string(),
            got: value.to_string(),
        }),
    }
}

/// Splits a line into trimmed `(key, value)` pairs.
fn tokenize(line: &str, line_no: usize) -> Result<Vec<(String, String)>, ParseError> {
    let mut pairs = Vec::new();
    for token in split_unescaped_commas(line) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (key, value) = match token.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (token, "true"),
        };
        if key.is_empty() {
            return Err(ParseError::EmptyKey {
                line: line_no,
                token: token.to_string(),
            });
        }
        pairs.push((key.to_string(), value.to_string()));
    }
    Ok(pairs)
}

/// Splits on unescaped commas. `\,` becomes `,` and `\\` becomes `\`;
/// any other backslash is kept as written.
fn split_unescaped_commas(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next_if(|&next| next == ',' || next == '\\') {
                Some(escaped) => current.push(escaped),
                None => current.push(c),
            },
            ',' => tokens.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    tokens.push(current);
    tokens
}

/// Inverse of the token splitting: escapes backslashes and commas.
pub(crate) fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,")
}

/// Rewrites `enum=["a","b"]` as `enum=a,enum=b`.
fn expand_list_literals(line: &str, line_no: usize) -> Result<String, ParseError> {
    if !line.contains('[') {
        return Ok(line.to_string());
    }
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if let Some((key, body)) = list_literal_start(rest) {
            let malformed = || ParseError::MalformedList {
                line: line_no,
                key: key.to_string(),
            };
            let close = closing_bracket(body).ok_or_else(malformed)?;
            let expanded: Vec<String> = list_values(&body[..close])
                .iter()
                .map(|v| format!("{key}={}", escape_value(v)))
                .collect();
            out.push_str(&expanded.join(","));
            rest = &body[close + 1..];
            match rest.trim_start().strip_prefix(',') {
                Some(tail) => {
                    out.push(',');
                    rest = tail;
                    continue;
                }
                None if rest.trim().is_empty() => break,
                None => return Err(malformed()),
            }
        }
        match find_unescaped_comma(rest) {
            Some(idx) => {
                out.push_str(&rest[..=idx]);
                rest = &rest[idx + 1..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    Ok(out)
}

/// If `s` opens a list literal, returns the key and the text after `[`.
fn list_literal_start(s: &str) -> Option<(&'static str, &str)> {
    let s = s.trim_start();
    LIST_KEYS.iter().find_map(|key| {
        let body = s
            .strip_prefix(key)?
            .trim_start()
            .strip_prefix('=')?
            .trim_start()
            .strip_prefix('[')?;
        Some((*key, body))
    })
}

/// Byte offset of the `]` closing an already-opened `[`.
fn closing_bracket(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// JSON array body -> raw strings. Non-JSON bodies (`[a,b]`) fall back to
/// a plain comma split with quotes stripped.
fn list_values(inner: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<Value>>(&format!("[{inner}]")) {
        Ok(values) => values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Err(_) => inner
            .split(',')
            .map(|v| v.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
            .collect(),
    }
}

fn find_unescaped_comma(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ',' => return Some(idx),
            _ => {}
        }
    }
    None
}
