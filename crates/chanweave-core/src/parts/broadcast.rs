//! Broadcast: copy every input item to every connected output

use serde::{Deserialize, Serialize};

use super::{Bindings, Implementation, Part, PartImpl, RegisteredPart, default_element_type};
use crate::pin::PinDefinition;

fn default_outputs() -> usize {
    2
}

/// Fan-out part with a configurable number of outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Element type of the input and all outputs
    #[serde(rename = "type", default = "default_element_type")]
    pub ty: String,

    /// Number of outputs (`output0` .. `outputN-1`)
    #[serde(default = "default_outputs")]
    pub outputs: usize,
}

impl Default for Broadcast {
    fn default() -> Self {
        Self {
            ty: default_element_type(),
            outputs: default_outputs(),
        }
    }
}

impl Broadcast {
    fn output_name(i: usize) -> String {
        format!("output{}", i)
    }
}

impl PartImpl for Broadcast {
    fn pins(&self) -> Vec<PinDefinition> {
        let mut pins = vec![PinDefinition::input("input", &self.ty)];
        pins.extend((0..self.outputs).map(|i| PinDefinition::output(Self::output_name(i), &self.ty)));
        pins
    }

    fn implementation(&self, bindings: &Bindings) -> Implementation {
        if !bindings.is_bound("input") {
            return Implementation::default();
        }

        let sends: Vec<String> = (0..self.outputs)
            .map(Self::output_name)
            .filter(|name| bindings.is_bound(name))
            .map(|name| format!("\t{} <- v", name))
            .collect();

        let body = if sends.is_empty() {
            "for range input {\n}".to_string()
        } else {
            format!("for v := range input {{\n{}\n}}", sends.join("\n"))
        };

        Implementation {
            body,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.ty.trim().is_empty() {
            return Err("type must not be empty".to_string());
        }
        if self.outputs == 0 {
            return Err("outputs must be at least 1".to_string());
        }
        Ok(())
    }
}

impl RegisteredPart for Broadcast {
    const TYPE_KEY: &'static str = "Broadcast";
    const DESCRIPTION: &'static str = "Copies every input value to every output";
}

impl From<Broadcast> for Part {
    fn from(p: Broadcast) -> Self {
        Part::Broadcast(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::Direction;

    #[test]
    fn test_pin_count_follows_config() {
        let b = Broadcast {
            ty: "int".into(),
            outputs: 3,
        };
        let pins = b.pins();
        assert_eq!(pins.len(), 4);
        assert_eq!(pins[0].direction, Direction::Input);
        assert_eq!(pins[3].name, "output2");
        assert!(pins.iter().all(|p| p.ty == "int"));
    }

    #[test]
    fn test_only_bound_outputs_are_sent_to() {
        let b = Broadcast::default();
        let imp = b.implementation(&Bindings::new(["input", "output1"]));
        assert!(imp.body.contains("output1 <- v"));
        assert!(!imp.body.contains("output0"));
    }

    #[test]
    fn test_unbound_input_emits_nothing() {
        let imp = Broadcast::default().implementation(&Bindings::new(["output0"]));
        assert!(imp.body.is_empty());
    }

    #[test]
    fn test_no_outputs_drains_input() {
        let imp = Broadcast::default().implementation(&Bindings::new(["input"]));
        assert_eq!(imp.body, "for range input {\n}");
    }

    #[test]
    fn test_zero_outputs_rejected() {
        let b = Broadcast {
            ty: "int".into(),
            outputs: 0,
        };
        assert!(b.validate().is_err());
    }
}
