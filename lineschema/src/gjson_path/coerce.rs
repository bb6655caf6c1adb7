use serde::{Deserialize, Serialize};

use crate::ast::{Direction, Item, SchemaType};

pub const TO_NUMBER: &str = "@tonum";
pub const TO_BOOLEAN: &str = "@tobool";
pub const TO_STRING: &str = "@tostring";

/// Chooses the modifier appended to an item's source path, if any.
pub trait Coerce {
    fn suffix(&self, direction: Direction, item: &Item) -> Option<&'static str>;
}

/// Leaves every source path untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoCoercion;

impl Coerce for NoCoercion {
    fn suffix(&self, _direction: Direction, _item: &Item) -> Option<&'static str> {
        None
    }
}

/// Inbound: numeric formats read as numbers, boolean formats as booleans.
/// Outbound: string-typed fields are stringified whatever the live value is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCoercion;

impl Coerce for FormatCoercion {
    fn suffix(&self, direction: Direction, item: &Item) -> Option<&'static str> {
        match direction {
            Direction::In => match item.format.as_deref()? {
                "int" | "integer" | "float" | "number" => Some(TO_NUMBER),
                "bool" | "boolean" => Some(TO_BOOLEAN),
                _ => None,
            },
            Direction::Out => (item.schema_type == SchemaType::String).then_some(TO_STRING),
            Direction::Convert => None,
        }
    }
}

impl<F> Coerce for F
where
    F: Fn(Direction, &Item) -> Option<&'static str>,
{
    fn suffix(&self, direction: Direction, item: &Item) -> Option<&'static str> {
        self(direction, item)
    }
}
