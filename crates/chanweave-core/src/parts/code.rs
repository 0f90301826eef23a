//! Free-form Go code part

use serde::{Deserialize, Serialize};

use super::{Bindings, Implementation, Part, PartImpl, RegisteredPart};
use crate::pin::{PinDefinition, validate_pins};

/// User-written Go for each phase, with user-defined pins.
///
/// Unconnected pins arrive as `nil`; code that sends on an output should
/// check for that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Code {
    /// Go import paths
    #[serde(default)]
    pub imports: Vec<String>,

    /// Runs once before the instances
    #[serde(default)]
    pub head: String,

    /// Runs once per instance
    #[serde(default)]
    pub body: String,

    /// Runs once after all instances
    #[serde(default)]
    pub tail: String,

    /// Pin declarations
    #[serde(default)]
    pub pins: Vec<PinDefinition>,
}

impl PartImpl for Code {
    fn pins(&self) -> Vec<PinDefinition> {
        self.pins.clone()
    }

    fn implementation(&self, _bindings: &Bindings) -> Implementation {
        Implementation {
            head: self.head.clone(),
            body: self.body.clone(),
            tail: self.tail.clone(),
        }
    }

    fn imports(&self) -> Vec<String> {
        self.imports.clone()
    }

    fn validate(&self) -> Result<(), String> {
        validate_pins(&self.pins)?;
        for import in &self.imports {
            if import.is_empty() || import.contains(['"', '\n', ' ']) {
                return Err(format!("invalid import path '{}'", import));
            }
            let package = import.rsplit('/').next().unwrap_or(import);
            if let Some(pin) = self.pins.iter().find(|p| p.name == package) {
                return Err(format!(
                    "pin name '{}' would shadow the imported package '{}'",
                    pin.name, import
                ));
            }
        }
        Ok(())
    }
}

impl RegisteredPart for Code {
    const TYPE_KEY: &'static str = "Code";
    const DESCRIPTION: &'static str = "Free-form Go code with user-defined pins";
}

impl From<Code> for Part {
    fn from(p: Code) -> Self {
        Part::Code(p)
    }
}
