//! Join: merge several inputs into one output

use serde::{Deserialize, Serialize};

use super::{Bindings, Implementation, Part, PartImpl, RegisteredPart, default_element_type};
use crate::pin::PinDefinition;

fn default_inputs() -> usize {
    2
}

/// Fan-in part with a configurable number of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    /// Element type of all inputs and the output
    #[serde(rename = "type", default = "default_element_type")]
    pub ty: String,

    /// Number of inputs (`input0` .. `inputN-1`)
    #[serde(default = "default_inputs")]
    pub inputs: usize,
}

impl Default for Join {
    fn default() -> Self {
        Self {
            ty: default_element_type(),
            inputs: default_inputs(),
        }
    }
}

impl PartImpl for Join {
    fn pins(&self) -> Vec<PinDefinition> {
        let mut pins: Vec<_> = (0..self.inputs)
            .map(|i| PinDefinition::input(format!("input{}", i), &self.ty))
            .collect();
        pins.push(PinDefinition::output("output", &self.ty));
        pins
    }

    fn implementation(&self, bindings: &Bindings) -> Implementation {
        let inputs: Vec<String> = (0..self.inputs)
            .map(|i| format!("input{}", i))
            .filter(|name| bindings.is_bound(name))
            .collect();
        if inputs.is_empty() {
            return Implementation::default();
        }

        let forward = if bindings.is_bound("output") {
            "\t\tfor v := range in {\n\t\t\toutput <- v\n\t\t}"
        } else {
            "\t\tfor range in {\n\t\t}"
        };

        let body = format!(
            "var joinWG sync.WaitGroup\n\
             for _, in := range []<-chan {ty}{{{inputs}}} {{\n\
             \tjoinWG.Add(1)\n\
             \tgo func(in <-chan {ty}) {{\n\
             \t\tdefer joinWG.Done()\n\
             {forward}\n\
             \t}}(in)\n\
             }}\n\
             joinWG.Wait()",
            ty = self.ty,
            inputs = inputs.join(", "),
            forward = forward,
        );

        Implementation {
            body,
            ..Default::default()
        }
    }

    fn imports(&self) -> Vec<String> {
        vec!["sync".to_string()]
    }

    fn validate(&self) -> Result<(), String> {
        if self.ty.trim().is_empty() {
            return Err("type must not be empty".to_string());
        }
        if self.inputs == 0 {
            return Err("inputs must be at least 1".to_string());
        }
        Ok(())
    }
}

impl RegisteredPart for Join {
    const TYPE_KEY: &'static str = "Join";
    const DESCRIPTION: &'static str = "Merges all inputs into a single output";
}

impl From<Join> for Part {
    fn from(p: Join) -> Self {
        Part::Join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pins() {
        let j = Join {
            ty: "string".into(),
            inputs: 3,
        };
        let names: Vec<_> = j.pins().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["input0", "input1", "input2", "output"]);
    }

    #[test]
    fn test_merges_only_bound_inputs() {
        let j = Join {
            ty: "int".into(),
            inputs: 3,
        };
        let imp = j.implementation(&Bindings::new(["input0", "input2", "output"]));
        assert!(imp.body.contains("[]<-chan int{input0, input2}"));
        assert!(imp.body.contains("output <- v"));
        assert!(imp.body.ends_with("joinWG.Wait()"));
    }

    #[test]
    fn test_unbound_output_drains() {
        let imp = Join::default().implementation(&Bindings::new(["input1"]));
        assert!(imp.body.contains("for range in {"));
        assert!(!imp.body.contains("output <-"));
    }

    #[test]
    fn test_nothing_bound() {
        let imp = Join::default().implementation(&Bindings::new(["output"]));
        assert_eq!(imp, Implementation::default());
    }
}
