//! Filter: route each item by a predicate without changing its type

use serde::{Deserialize, Serialize};

use super::{Bindings, Implementation, Part, PartImpl, RegisteredPart, default_element_type};
use crate::pin::PinDefinition;

/// Sends items for which `predicate` holds to `match`, the rest to `nomatch`.
///
/// The predicate is a Go boolean expression over `v`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Element type of the input and both outputs
    #[serde(rename = "type", default = "default_element_type")]
    pub ty: String,

    /// Go boolean expression over `v`
    pub predicate: String,
}

impl PartImpl for Filter {
    fn pins(&self) -> Vec<PinDefinition> {
        vec![
            PinDefinition::input("input", &self.ty),
            PinDefinition::output("match", &self.ty),
            PinDefinition::output("nomatch", &self.ty),
        ]
    }

    fn implementation(&self, bindings: &Bindings) -> Implementation {
        if !bindings.is_bound("input") {
            return Implementation::default();
        }

        let head = format!(
            "keep := func(v {}) bool {{\n\treturn {}\n}}",
            self.ty, self.predicate
        );

        let branch = |pin: &str| {
            if bindings.is_bound(pin) {
                format!("\t\t{} <- v\n", pin)
            } else {
                String::new()
            }
        };

        let body = format!(
            "for v := range input {{\n\tif keep(v) {{\n{}\t}} else {{\n{}\t}}\n}}",
            branch("match"),
            branch("nomatch"),
        );

        Implementation {
            head,
            body,
            tail: String::new(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.ty.trim().is_empty() {
            return Err("type must not be empty".to_string());
        }
        if self.predicate.trim().is_empty() {
            return Err("predicate must not be empty".to_string());
        }
        Ok(())
    }
}

impl RegisteredPart for Filter {
    const TYPE_KEY: &'static str = "Filter";
    const DESCRIPTION: &'static str = "Routes values to match/nomatch by a predicate";
}

impl From<Filter> for Part {
    fn from(p: Filter) -> Self {
        Part::Filter(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even() -> Filter {
        Filter {
            ty: "int".into(),
            predicate: "v%2 == 0".into(),
        }
    }

    #[test]
    fn test_outputs_are_same_type_as_input() {
        assert!(even().pins().iter().all(|p| p.ty == "int"));
    }

    #[test]
    fn test_head_defines_predicate() {
        let imp = even().implementation(&Bindings::new(["input", "match"]));
        assert_eq!(imp.head, "keep := func(v int) bool {\n\treturn v%2 == 0\n}");
        assert!(imp.body.contains("match <- v"));
        assert!(!imp.body.contains("nomatch <- v"));
    }

    #[test]
    fn test_unbound_input() {
        let imp = even().implementation(&Bindings::new(["match", "nomatch"]));
        assert_eq!(imp, Implementation::default());
    }

    #[test]
    fn test_empty_predicate_rejected() {
        let f = Filter {
            ty: "int".into(),
            predicate: "  ".into(),
        };
        assert!(f.validate().is_err());
    }
}
