//! Sink: receive and discard

use serde::{Deserialize, Serialize};

use super::{Bindings, Implementation, Part, PartImpl, RegisteredPart, default_element_type};
use crate::pin::PinDefinition;

/// Drains its input until it is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    /// Element type of the input
    #[serde(rename = "type", default = "default_element_type")]
    pub ty: String,
}

impl Default for Sink {
    fn default() -> Self {
        Self {
            ty: default_element_type(),
        }
    }
}

impl PartImpl for Sink {
    fn pins(&self) -> Vec<PinDefinition> {
        vec![PinDefinition::input("input", &self.ty)]
    }

    fn implementation(&self, bindings: &Bindings) -> Implementation {
        if !bindings.is_bound("input") {
            return Implementation::default();
        }
        Implementation {
            body: "for range input {\n}".to_string(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.ty.trim().is_empty() {
            return Err("type must not be empty".to_string());
        }
        Ok(())
    }
}

impl RegisteredPart for Sink {
    const TYPE_KEY: &'static str = "Sink";
    const DESCRIPTION: &'static str = "Discards every value it receives";
}

impl From<Sink> for Part {
    fn from(p: Sink) -> Self {
        Part::Sink(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_drains_when_bound() {
        let imp = Sink::default().implementation(&Bindings::new(["input"]));
        assert_eq!(imp.body, "for range input {\n}");
        assert!(Sink::default().implementation(&Bindings::none()).body.is_empty());
    }
}
