/// Path expression compiler: item list -> one gjson-style query that
/// reshapes the source document into the destination layout.
///
/// Keys come from each item's destination (`dst`, positional `#` read as an
/// array hop), values from its source path plus an optional coercion
/// modifier. Objects reached through an array hop render with `|@group`.
pub mod coerce;
pub mod render;
pub mod tree;

pub use coerce::{Coerce, FormatCoercion, NoCoercion};
pub use tree::{PathGroup, PathNode};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::ast::{Direction, Item, Jsonschemaline};

/// Options for [`compile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOptions {
    /// Leading path (usually the schema id) removed from every destination
    /// before it is used as a key.
    #[serde(default)]
    pub strip_prefix: Option<String>,
}

impl PathOptions {
    pub fn strip_namespace(id: impl Into<String>) -> Self {
        Self {
            strip_prefix: Some(id.into()),
        }
    }
}

/// A rendered path expression such as `{items:{id:P.#.id}|@group}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathExpression(String);

impl PathExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn compile(
    items: &[Item],
    direction: Direction,
    coerce: &dyn Coerce,
    options: &PathOptions,
) -> PathExpression {
    let tree = tree::build(items, direction, coerce, options);
    let expr = render::render(&tree);
    debug!(items = items.len(), len = expr.len(), "compiled path expression");
    PathExpression(expr)
}

impl Jsonschemaline {
    /// Path expression for this schema with the default format coercion.
    pub fn gjson_path(&self) -> PathExpression {
        compile(
            &self.items,
            self.meta.direction,
            &FormatCoercion,
            &PathOptions::default(),
        )
    }

    pub fn gjson_path_with(&self, coerce: &dyn Coerce, options: &PathOptions) -> PathExpression {
        compile(&self.items, self.meta.direction, coerce, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_array_items_grouped() {
        let mut id = Item::new("items[].id");
        id.src = "P.#.id".into();
        id.required = true;
        let expr = compile(&[id], Direction::Out, &NoCoercion, &PathOptions::default());
        assert_eq!(expr.as_str(), "{items:{id:P.#.id}|@group}");
    }

    #[test]
    fn test_empty() {
        let expr = compile(&[], Direction::In, &FormatCoercion, &PathOptions::default());
        assert_eq!(expr.to_string(), "{}");
    }

    #[test]
    fn test_inbound_coercion_from_parsed_schema() {
        let line = parse(
            "version=v1,direction=in,id=in\n\
             fullname=pageIndex,src=input.pageIndex,dst=pageIndex,format=int\n\
             fullname=pageSize,src=input.pageSize,dst=pageSize,format=int\n\
             fullname=enabled,src=input.on,dst=flags.enabled,format=bool\n\
             fullname=name,src=input.name,dst=name",
        )
        .unwrap();
        assert_eq!(
            line.gjson_path().as_str(),
            "{pageIndex:input.pageIndex.@tonum,pageSize:input.pageSize.@tonum,\
             flags:{enabled:input.on.@tobool},name:input.name}"
        );
    }

    #[test]
    fn test_outbound_namespace_and_stringify() {
        let line = parse(
            "version=v1,direction=out,id=out\n\
             fullname=items[].id,src=P.#.id\n\
             fullname=items[].price,src=P.#.price,type=number\n\
             fullname=total,src=count,type=integer",
        )
        .unwrap();
        assert_eq!(
            line.gjson_path().as_str(),
            "{out:{items:{id:P.#.id.@tostring,price:P.#.price}|@group,total:count}}"
        );
        let stripped = line.gjson_path_with(&NoCoercion, &PathOptions::strip_namespace("out"));
        assert_eq!(
            stripped.as_str(),
            "{items:{id:P.#.id,price:P.#.price}|@group,total:count}"
        );
    }

    #[test]
    fn test_root_array_destination() {
        let line =
            parse("version=v1,direction=out,id=o\nfullname=[].x,src=list.#.x,dst=#.x").unwrap();
        assert_eq!(
            line.gjson_path_with(&NoCoercion, &PathOptions::default()).as_str(),
            "{x:list.#.x}|@group"
        );
    }

    #[test]
    fn test_idempotent() {
        let line = parse(
            "version=v1,direction=out,id=o\n\
             fullname=list[].pricing.tiers[].min,src=P.#.pricing.tiers.#.min\n\
             fullname=list[].name,src=P.#.name",
        )
        .unwrap();
        assert_eq!(line.gjson_path(), line.gjson_path());
    }
}
