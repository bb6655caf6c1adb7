//! Lineschema: a line-oriented DSL describing the shape of a JSON document
//! and the bindings that fill it.
//!
//! ```text
//! version=v1,direction=in,id=root
//! fullname=pageSize,format=number,required,dst=Limit
//! ```
//!
//! A parsed [`Jsonschemaline`] compiles into a JSON Schema document
//! ([`Jsonschemaline::to_json_schema`]), a gjson-style reshaping query
//! ([`Jsonschemaline::gjson_path`]) and an ordered list of copy steps
//! ([`Jsonschemaline::instructions`]). JSON Schema converts back with
//! [`schema::from_json_schema`].
pub mod ast;
pub mod error;
pub mod gjson_path;
pub mod infer;
pub mod instruct;
pub mod parser;
pub mod path;
pub mod schema;
pub mod writer;

pub use ast::{Direction, Item, Jsonschemaline, Meta, SchemaType, DEFAULT_ID, DEFAULT_VERSION};
pub use error::{ConversionError, ParseError};
pub use gjson_path::{Coerce, FormatCoercion, NoCoercion, PathExpression, PathOptions};
pub use instruct::{Command, Instruction, InstructionTemplate};
pub use parser::{parse, parse_many};
pub use writer::FieldOrder;
