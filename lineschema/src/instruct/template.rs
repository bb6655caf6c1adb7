/// Named template blocks: one `{{define "<id>"}} .. {{end}}` per schema.
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::Instruction;
use crate::ast::{Direction, Jsonschemaline};
use crate::error::ParseError;
use crate::parser::parse_many;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionTemplate {
    pub id: String,
    pub version: String,
    pub direction: Direction,
    pub instructions: Vec<Instruction>,
}

impl InstructionTemplate {
    pub fn from_schema(line: &Jsonschemaline) -> Self {
        Self {
            id: line.meta.id.clone(),
            version: line.meta.version.clone(),
            direction: line.meta.direction,
            instructions: line.instructions(),
        }
    }
}

impl From<&Jsonschemaline> for InstructionTemplate {
    fn from(line: &Jsonschemaline) -> Self {
        Self::from_schema(line)
    }
}

impl fmt::Display for InstructionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{{{define \"{}\"}}}}", self.id)?;
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction.render())?;
        }
        f.write_str("{{end}}")
    }
}

/// One template per blank-line-separated schema in `text`.
pub fn parse_templates(text: &str) -> Result<Vec<InstructionTemplate>, ParseError> {
    let templates: Vec<InstructionTemplate> = parse_many(text)?
        .iter()
        .map(InstructionTemplate::from_schema)
        .collect();
    debug!(templates = templates.len(), "built instruction templates");
    Ok(templates)
}

/// Looks a template up by schema id.
pub fn find_template<'a>(
    templates: &'a [InstructionTemplate],
    id: &str,
) -> Option<&'a InstructionTemplate> {
    templates.iter().find(|t| t.id == id)
}
