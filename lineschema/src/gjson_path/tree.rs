/// Typed key tree built from destination paths before rendering.
use tracing::trace;

use super::coerce::Coerce;
use super::PathOptions;
use crate::ast::{Direction, Item};
use crate::path::{self, Segment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathNode {
    /// Source path, already coerced.
    Leaf(String),
    Group(PathGroup),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathGroup {
    /// Keys in first-declaration order.
    pub children: Vec<(String, PathNode)>,
    /// Set when the key that owns this group was an array hop.
    pub is_array: bool,
}

impl PathGroup {
    /// Places `src` at the key path `segments`. A nested key turns an
    /// existing leaf into a group.
    fn insert(&mut self, segments: &[Segment], src: String) {
        let Some((seg, rest)) = segments.split_first() else {
            return;
        };
        if seg.name.is_empty() {
            self.is_array = true;
            return self.insert(rest, src);
        }
        if rest.is_empty() {
            return self.set_leaf(&seg.name, src);
        }
        let pos = match self.children.iter().position(|(k, _)| *k == seg.name) {
            Some(pos) => pos,
            None => {
                self.children
                    .push((seg.name.clone(), PathNode::Group(PathGroup::default())));
                self.children.len() - 1
            }
        };
        let slot = &mut self.children[pos].1;
        match slot {
            PathNode::Group(group) => {
                group.is_array |= seg.is_array;
                group.insert(rest, src);
            }
            PathNode::Leaf(old) => {
                trace!(key = %seg.name, src = %old, "nested key replaces leaf");
                let mut group = PathGroup {
                    is_array: seg.is_array,
                    ..PathGroup::default()
                };
                group.insert(rest, src);
                *slot = PathNode::Group(group);
            }
        }
    }

    fn set_leaf(&mut self, key: &str, src: String) {
        match self.children.iter_mut().find(|(k, _)| k == key) {
            Some((_, PathNode::Group(_))) => trace!(key, "leaf shadowed by nested keys"),
            Some((_, slot)) => *slot = PathNode::Leaf(src),
            None => self.children.push((key.to_string(), PathNode::Leaf(src))),
        }
    }

    /// True when any leaf below this group addresses array elements
    /// positionally.
    pub fn has_wildcard(&self) -> bool {
        self.children.iter().any(|(_, node)| match node {
            PathNode::Leaf(src) => path::has_wildcard(src),
            PathNode::Group(group) => group.has_wildcard(),
        })
    }
}

/// Destination key path of an item: `dst` in fullname form, or the
/// fullname when `dst` is unset.
fn key_path(item: &Item, options: &PathOptions) -> String {
    let dst = if item.dst.is_empty() {
        item.fullname.as_str()
    } else {
        item.dst.as_str()
    };
    let dst = match &options.strip_prefix {
        Some(prefix) => dst
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(dst),
        None => dst,
    };
    path::from_gjson_style(dst)
}

pub fn build(
    items: &[Item],
    direction: Direction,
    coerce: &dyn Coerce,
    options: &PathOptions,
) -> PathGroup {
    let mut root = PathGroup::default();
    for item in items {
        if item.is_template() {
            trace!(fullname = %item.fullname, "template binding has no path form");
            continue;
        }
        let segments = path::split_segments(&key_path(item, options));
        let src = match coerce.suffix(direction, item) {
            Some(suffix) => format!("{}.{suffix}", item.src),
            None => item.src.clone(),
        };
        root.insert(&segments, src);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gjson_path::NoCoercion;

    fn item(fullname: &str, src: &str) -> Item {
        let mut item = Item::new(fullname);
        item.src = src.into();
        item
    }

    #[test]
    fn test_build_marks_arrays() {
        let tree = build(
            &[item("items[].id", "P.#.id"), item("items[].name", "P.#.name")],
            Direction::Out,
            &NoCoercion,
            &PathOptions::default(),
        );
        assert_eq!(tree.children.len(), 1);
        let PathNode::Group(items) = &tree.children[0].1 else {
            panic!("expected group");
        };
        assert!(items.is_array);
        assert_eq!(
            items.children,
            vec![
                ("id".to_string(), PathNode::Leaf("P.#.id".into())),
                ("name".to_string(), PathNode::Leaf("P.#.name".into())),
            ]
        );
        assert!(tree.has_wildcard());
    }

    #[test]
    fn test_group_wins_over_leaf() {
        let tree = build(
            &[item("a", "x"), item("a.b", "y"), item("a", "z")],
            Direction::In,
            &NoCoercion,
            &PathOptions::default(),
        );
        let PathNode::Group(a) = &tree.children[0].1 else {
            panic!("expected group");
        };
        assert_eq!(a.children, vec![("b".to_string(), PathNode::Leaf("y".into()))]);
    }

    #[test]
    fn test_leaf_replaced_by_array_group() {
        let tree = build(
            &[item("a", "x"), item("a[].b", "P.#.b")],
            Direction::Out,
            &NoCoercion,
            &PathOptions::default(),
        );
        assert_eq!(
            tree.children,
            vec![(
                "a".to_string(),
                PathNode::Group(PathGroup {
                    children: vec![("b".to_string(), PathNode::Leaf("P.#.b".into()))],
                    is_array: true,
                })
            )]
        );
    }

    #[test]
    fn test_key_from_dst_with_prefix_stripped() {
        let mut it = item("pageSize", "input.pageSize");
        it.dst = "root.page.#.size".into();
        let options = PathOptions::strip_namespace("root");
        assert_eq!(key_path(&it, &options), "page[].size");
        assert_eq!(key_path(&it, &PathOptions::default()), "root.page[].size");
        it.dst = "rootless.x".into();
        assert_eq!(key_path(&it, &options), "rootless.x");
    }
}
