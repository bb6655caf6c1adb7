//! Error taxonomy. Every failure is returned as a value with enough context
//! (line number or path) to locate the offending declaration.

/// Malformed lineschema text. Line numbers are 1-based positions within the
/// text handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: meta line requires a non-empty '{field}'")]
    MissingMetaField { line: usize, field: &'static str },
    #[error("line {line}: direction must be one of [in, out, convert], got '{got}'")]
    InvalidDirection { line: usize, got: String },
    #[error("line {line}: a second meta line in the same schema")]
    DuplicateMeta { line: usize },
    #[error("schema starting at line {line} has no meta line (version, direction, id)")]
    MissingMeta { line: usize },
    #[error("line {line}: fullname required")]
    MissingFullname { line: usize },
    #[error("line {line}: at least one of src/dst required for '{fullname}'")]
    MissingBinding { line: usize, fullname: String },
    #[error("line {line}: unknown type '{got}'")]
    UnknownType { line: usize, got: String },
    #[error("line {line}: '{key}' expects true or false, got '{got}'")]
    InvalidFlag {
        line: usize,
        key: String,
        got: String,
    },
    #[error("line {line}: unterminated list literal for '{key}'")]
    MalformedList { line: usize, key: String },
    #[error("line {line}: empty key in '{token}'")]
    EmptyKey { line: usize, token: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::MissingMetaField { line, .. }
            | ParseError::InvalidDirection { line, .. }
            | ParseError::DuplicateMeta { line }
            | ParseError::MissingMeta { line }
            | ParseError::MissingFullname { line }
            | ParseError::MissingBinding { line, .. }
            | ParseError::UnknownType { line, .. }
            | ParseError::InvalidFlag { line, .. }
            | ParseError::MalformedList { line, .. }
            | ParseError::EmptyKey { line, .. } => *line,
        }
    }
}

/// Failure converting between the item list and a JSON Schema document.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("schema at '{path}' must be a JSON object")]
    NotAnObject { path: String },
    #[error("'{path}' is declared as {existing} and cannot also be used as {requested}")]
    KindConflict {
        path: String,
        existing: &'static str,
        requested: &'static str,
    },
    #[error("'required' at '{path}' must be an array of strings")]
    InvalidRequired { path: String },
    #[error("unknown type '{got}' at '{path}'")]
    UnknownType { path: String, got: String },
}
