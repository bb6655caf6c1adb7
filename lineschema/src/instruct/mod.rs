/// Instruction compiler: item list -> ordered copy/initialize steps.
///
/// Every item yields one copy step. Outbound schemas additionally get one
/// initialization step per enclosing container, deduplicated and ordered
/// outermost first, all ahead of the copies. An array that receives no
/// elements therefore still appears (empty) in the output document.
pub mod template;

pub use template::{find_template, parse_templates, InstructionTemplate};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::ast::{is_template, Direction, Item, Jsonschemaline};
use crate::path;

/// Formats copied with the numeric command.
const NUMERIC_FORMATS: [&str; 4] = ["number", "int", "integer", "float"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    CopyNumber,
    CopyValue,
    InitArray,
    InitObject,
    /// The binding itself is a template and is emitted verbatim.
    Template,
}

impl Command {
    /// Template function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::CopyNumber => "getSetNumber",
            Command::CopyValue => "getSetValue",
            Command::InitArray | Command::InitObject => "setValue",
            Command::Template => "template",
        }
    }

    pub fn is_init(&self) -> bool {
        matches!(self, Command::InitArray | Command::InitObject)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    /// Fullname-style path of the value this step writes.
    pub target_id: String,
    pub command: Command,
    pub src: String,
    pub dst: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Instruction {
    /// The template action for this step.
    pub fn render(&self) -> String {
        match &self.template {
            Some(tpl) => tpl.clone(),
            None => format!(
                "{{{{{} . \"{}\" \"{}\"}}}}",
                self.command.as_str(),
                self.dst,
                self.src
            ),
        }
    }

    fn copy(item: &Item) -> Option<Instruction> {
        if item.src == item.dst {
            trace!(fullname = %item.fullname, "src equals dst, nothing to copy");
            return None;
        }
        let literal = [&item.src, &item.dst]
            .into_iter()
            .rev()
            .find(|binding| is_template(binding))
            .cloned();
        let command = match (&literal, item.format.as_deref()) {
            (Some(_), _) => Command::Template,
            (None, Some(format)) if NUMERIC_FORMATS.contains(&format) => Command::CopyNumber,
            (None, _) => Command::CopyValue,
        };
        Some(Instruction {
            target_id: item.fullname.clone(),
            command,
            src: item.src.clone(),
            dst: item.dst.clone(),
            template: literal,
        })
    }

    /// Empty array or object at container `target` (fullname form, no
    /// trailing `[]`) under `root`.
    fn init(target: &str, is_array: bool, root: &str) -> Instruction {
        let gjson = path::to_gjson_style(target);
        let dst = if gjson.is_empty() {
            root.to_string()
        } else if root.is_empty() {
            gjson
        } else {
            format!("{root}.{gjson}")
        };
        let (command, value) = if is_array {
            (Command::InitArray, "list")
        } else {
            (Command::InitObject, "dict")
        };
        Instruction {
            target_id: target.to_string(),
            command,
            template: Some(format!("{{{{setValue . \"{dst}\" {value} }}}}")),
            src: String::new(),
            dst,
        }
    }
}

/// Containers enclosing `fullname`, innermost first.
fn ancestors(fullname: &str, root: &str) -> Vec<Instruction> {
    let mut out = Vec::new();
    let mut rest = fullname;
    while let Some(container) = path::parent(rest) {
        rest = container;
        let instruction = match container.strip_suffix(path::ARRAY_SUFFIX) {
            Some(array) => Instruction::init(array, true, root),
            None => Instruction::init(container, false, root),
        };
        out.push(instruction);
    }
    out
}

/// Compile the steps that materialize `items`. `root` is the namespace the
/// destination document lives under (the schema id).
pub fn compile(items: &[Item], direction: Direction, root: &str) -> Vec<Instruction> {
    let mut copies: Vec<Instruction> = items.iter().filter_map(Instruction::copy).collect();
    copies.sort_by_key(|i| path::depth(&i.target_id));

    let mut inits = Vec::new();
    if direction == Direction::Out {
        let mut seen = HashSet::new();
        for item in items {
            for init in ancestors(&item.fullname, root) {
                if seen.insert(init.target_id.clone()) {
                    inits.push(init);
                }
            }
        }
        inits.sort_by_key(|i| path::depth(&i.target_id));
    }

    debug!(
        %direction,
        inits = inits.len(),
        copies = copies.len(),
        "compiled instructions"
    );
    inits.extend(copies);
    inits
}

impl Jsonschemaline {
    pub fn instructions(&self) -> Vec<Instruction> {
        compile(&self.items, self.meta.direction, &self.meta.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn targets(instructions: &[Instruction]) -> Vec<&str> {
        instructions.iter().map(|i| i.target_id.as_str()).collect()
    }

    #[test]
    fn test_outbound_initializes_containers_first() {
        let line = parse(
            "version=v1,direction=out,id=out\n\
             fullname=items[].pricing.tiers[].min,src=P.#.pricing.tiers.#.min,format=int\n\
             fullname=items[].id,src=P.#.id\n\
             fullname=pageInfo.total,src=count,format=int",
        )
        .unwrap();
        let instructions = line.instructions();
        assert_eq!(
            targets(&instructions),
            vec![
                "items",
                "pageInfo",
                "items[].pricing",
                "items[].pricing.tiers",
                "items[].id",
                "pageInfo.total",
                "items[].pricing.tiers[].min",
            ]
        );
        assert_eq!(
            instructions[0].render(),
            "{{setValue . \"out.items\" list }}"
        );
        assert_eq!(
            instructions[2].render(),
            "{{setValue . \"out.items.#.pricing\" dict }}"
        );
        assert_eq!(instructions[3].command, Command::InitArray);
        assert_eq!(
            instructions[5].render(),
            "{{getSetNumber . \"out.pageInfo.total\" \"count\"}}"
        );
        assert_eq!(instructions[4].command, Command::CopyValue);
    }

    #[test]
    fn test_inbound_has_no_inits() {
        let line = parse(
            "version=v1,direction=in,id=in\n\
             fullname=config.name,dst=Name\n\
             fullname=config.size,dst=Size,format=number",
        )
        .unwrap();
        let instructions = line.instructions();
        assert_eq!(targets(&instructions), vec!["config.name", "config.size"]);
        assert_eq!(
            instructions[1].render(),
            "{{getSetNumber . \"Size\" \"in.config.size\"}}"
        );
    }

    #[test]
    fn test_same_src_and_dst_skipped() {
        let line = parse("version=v1,direction=in,id=in\nfullname=a,dst=in.a").unwrap();
        assert!(line.instructions().is_empty());
    }

    #[test]
    fn test_literal_template_binding() {
        let mut item = Item::new("now");
        item.src = "{{currentTime}}".into();
        item.dst = "out.now".into();
        let instructions = compile(&[item], Direction::Convert, "out");
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].command, Command::Template);
        assert_eq!(instructions[0].render(), "{{currentTime}}");
    }

    #[test]
    fn test_root_array_init() {
        let mut item = Item::new("[].id");
        item.src = "list.#.id".into();
        item.dst = "#.id".into();
        let instructions = compile(&[item], Direction::Out, "out");
        assert_eq!(instructions[0].target_id, "");
        assert_eq!(instructions[0].render(), "{{setValue . \"out\" list }}");
    }

    #[test]
    fn test_dedup_shared_ancestors() {
        let items: Vec<Item> = ["a.b.c", "a.b.d", "a.e"]
            .into_iter()
            .map(|name| {
                let mut item = Item::new(name);
                item.src = format!("s.{name}");
                item.dst = format!("o.{name}");
                item
            })
            .collect();
        let instructions = compile(&items, Direction::Out, "o");
        let inits: Vec<&str> = instructions
            .iter()
            .filter(|i| i.command.is_init())
            .map(|i| i.target_id.as_str())
            .collect();
        assert_eq!(inits, vec!["a", "a.b"]);
    }
}
