//! Fullname path grammar shared by every consumer.
//!
//! A fullname is a `.`-separated list of segments; a segment ending in `[]`
//! is an array hop: navigate into the array, then continue into its
//! elements. `items[].pricing.tiers[].min` reads as
//! object.items (array) -> element.pricing (object) -> tiers (array) -> element.min.
//!
//! Malformed input is normalized, never rejected: leading/trailing dots are
//! trimmed and empty segments dropped.

/// Suffix marking an array hop in a fullname.
pub const ARRAY_SUFFIX: &str = "[]";
/// Positional wildcard used by gjson-style paths.
pub const INDEX_MARKER: &str = "#";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Property name; empty for a root-level `[]` hop.
    pub name: String,
    pub is_array: bool,
}

impl Segment {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: false,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: true,
        }
    }
}

pub fn split_segments(fullname: &str) -> Vec<Segment> {
    fullname
        .trim_matches('.')
        .split('.')
        .filter(|raw| !raw.is_empty())
        .map(|raw| match raw.strip_suffix(ARRAY_SUFFIX) {
            Some(name) => Segment::array(name),
            None => Segment::object(raw),
        })
        .collect()
}

/// Number of segments above the leaf. Used as a sort key so that outer
/// containers order before inner ones.
pub fn depth(fullname: &str) -> usize {
    split_segments(fullname).len().saturating_sub(1)
}

/// `items[].id` -> `items.#.id`
pub fn to_gjson_style(fullname: &str) -> String {
    fullname
        .replace(ARRAY_SUFFIX, ".#")
        .split('.')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// `items.#.id` -> `items[].id`; the inverse of [`to_gjson_style`].
pub fn from_gjson_style(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for part in path.split('.').filter(|s| !s.is_empty()) {
        if part == INDEX_MARKER {
            out.push_str(ARRAY_SUFFIX);
            continue;
        }
        if !out.is_empty() {
            out.push('.');
        }
        out.push_str(part);
    }
    out
}

/// Appends a property name to a fullname prefix.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Everything before the last `.`, if any.
pub fn parent(fullname: &str) -> Option<&str> {
    fullname.rfind('.').map(|idx| &fullname[..idx])
}

/// True when `path` addresses array elements positionally (`a.#.b`,
/// `a.#(x==1).b`).
pub fn has_wildcard(path: &str) -> bool {
    path.split('.')
        .any(|part| part == INDEX_MARKER || part.starts_with("#("))
}

/// True when `ancestor` names a strict enclosing container of `path`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) if !rest.is_empty() => {
            ancestor.is_empty() || rest.starts_with('.') || rest.starts_with(ARRAY_SUFFIX)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nested_arrays() {
        let segs = split_segments("items[].pricing.tiers[].min");
        assert_eq!(
            segs,
            vec![
                Segment::array("items"),
                Segment::object("pricing"),
                Segment::array("tiers"),
                Segment::object("min"),
            ]
        );
    }

    #[test]
    fn test_split_normalizes() {
        assert_eq!(
            split_segments(".a..b."),
            vec![Segment::object("a"), Segment::object("b")]
        );
        assert!(split_segments("").is_empty());
        assert_eq!(
            split_segments("[]._param"),
            vec![Segment::array(""), Segment::object("_param")]
        );
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth("pageSize"), 0);
        assert_eq!(depth("pageInfo.total"), 1);
        assert_eq!(depth("items[].pricing.tiers[].min"), 3);
        assert_eq!(depth(""), 0);
    }

    #[test]
    fn test_gjson_style() {
        assert_eq!(to_gjson_style("items[].id"), "items.#.id");
        assert_eq!(to_gjson_style("tags[]"), "tags.#");
        assert_eq!(to_gjson_style("[].x"), "#.x");
        assert_eq!(from_gjson_style("items.#.id"), "items[].id");
        assert_eq!(from_gjson_style("data.#.more.enum.#"), "data[].more.enum[]");
    }

    #[test]
    fn test_wildcard() {
        assert!(has_wildcard("P.#.id"));
        assert!(has_wildcard("list.#(id==1).name"));
        assert!(!has_wildcard("input.pageIndex"));
        assert!(!has_wildcard("a.#b"));
    }

    #[test]
    fn test_ancestry() {
        assert!(is_ancestor("items", "items[].id"));
        assert!(is_ancestor("pageInfo", "pageInfo.total"));
        assert!(!is_ancestor("item", "items"));
        assert!(!is_ancestor("items", "items"));
        assert_eq!(parent("a[].b.c"), Some("a[].b"));
        assert_eq!(parent("a"), None);
    }
}
