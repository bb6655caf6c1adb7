use super::tree::{PathGroup, PathNode};

/// Marker turning an object of parallel arrays into an array of objects.
pub const GROUP_MODIFIER: &str = "|@group";

/// Render the root group as a path expression.
pub fn render(root: &PathGroup) -> String {
    let mut out = String::new();
    write_group(&mut out, root, false);
    if root.is_array {
        out.push_str(GROUP_MODIFIER);
    }
    out
}

/// A group is grouped when its key was an array hop, or when it sits below
/// a grouped group and still reads array elements positionally: grouping
/// has to pass through the object levels between two array hops.
fn is_grouped(group: &PathGroup, in_group: bool) -> bool {
    group.is_array || (in_group && group.has_wildcard())
}

fn write_group(out: &mut String, group: &PathGroup, in_group: bool) {
    out.push('{');
    for (i, (key, node)) in group.children.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push(':');
        match node {
            PathNode::Leaf(src) => out.push_str(src),
            PathNode::Group(child) => {
                let grouped = is_grouped(child, in_group);
                write_group(out, child, in_group || grouped);
                if grouped {
                    out.push_str(GROUP_MODIFIER);
                }
            }
        }
    }
    out.push('}');
}
