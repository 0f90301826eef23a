//! Pin definitions
//!
//! A pin is a named, typed, directional attachment point on a part.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Direction of data flow through a pin, seen from the part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The part receives from the channel
    Input,
    /// The part sends to the channel
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Immutable pin descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDefinition {
    /// Pin name (unique within one part)
    pub name: String,

    /// Go element type carried by the pin
    #[serde(rename = "type")]
    pub ty: String,

    /// Data direction
    pub direction: Direction,
}

impl PinDefinition {
    /// Create an input pin
    pub fn input(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            direction: Direction::Input,
        }
    }

    /// Create an output pin
    pub fn output(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            direction: Direction::Output,
        }
    }
}

static GO_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Names the generated node functions use for their own locals.
const RESERVED_PIN_NAMES: &[&str] = &[
    "instanceNumber",
    "multiplicity",
    "instanceWG",
    "sync",
    "nil",
    "_",
];

const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Universe-scope names. A parameter with one of these names would shadow
/// the builtin, e.g. `close` in the generated tail.
const GO_PREDECLARED: &[&str] = &[
    // types
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    // constants
    "true",
    "false",
    "iota",
    // functions
    "append",
    "cap",
    "clear",
    "close",
    "complex",
    "copy",
    "delete",
    "imag",
    "len",
    "make",
    "max",
    "min",
    "new",
    "panic",
    "print",
    "println",
    "real",
    "recover",
];

/// Check that a pin name can be used verbatim as a Go parameter name.
pub fn validate_pin_name(name: &str) -> std::result::Result<(), String> {
    if !GO_IDENT.is_match(name) {
        return Err(format!("pin name '{}' is not a Go identifier", name));
    }
    if GO_KEYWORDS.contains(&name) || RESERVED_PIN_NAMES.contains(&name) {
        return Err(format!("pin name '{}' is reserved", name));
    }
    if GO_PREDECLARED.contains(&name) {
        return Err(format!(
            "pin name '{}' would shadow a Go predeclared identifier",
            name
        ));
    }
    Ok(())
}

/// Check a list of pins for valid, unique names and non-empty types.
pub fn validate_pins(pins: &[PinDefinition]) -> std::result::Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for pin in pins {
        validate_pin_name(&pin.name)?;
        if pin.ty.trim().is_empty() {
            return Err(format!("pin '{}' has an empty type", pin.name));
        }
        if !seen.insert(pin.name.as_str()) {
            return Err(format!("duplicate pin name '{}'", pin.name));
        }
    }
    Ok(())
}
