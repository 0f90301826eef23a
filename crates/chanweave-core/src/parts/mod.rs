//! Parts: the pluggable behavior a node wraps
//!
//! A part declares its pins and a three-phase Go implementation:
//!
//! - `head` runs once before any instance starts
//! - `body` runs `multiplicity` times concurrently; `instanceNumber` and
//!   `multiplicity` are in scope
//! - `tail` runs once after every instance has returned
//!
//! Parts never close their output channels. The generator appends the
//! closing statements to the tail so every output is closed exactly once per
//! node. Pins that are not connected are passed as `nil`; parts consult the
//! [`Bindings`] they are given and leave such pins alone.
//!
//! # Built-in Parts
//!
//! - `Code` - free-form Go with user-defined pins
//! - `Broadcast` - copy every input item to every output
//! - `Join` - merge several inputs into one output
//! - `Filter` - route items to `match` / `nomatch` by a predicate
//! - `Sink` - discard everything
//! - `HTTPServer` - serve HTTP and emit one `*HTTPRequest` per request

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::pin::PinDefinition;

pub mod broadcast;
pub mod code;
pub mod filter;
pub mod http_server;
pub mod join;
pub mod sink;

pub use broadcast::Broadcast;
pub use code::Code;
pub use filter::Filter;
pub use http_server::HttpServer;
pub use join::Join;
pub use sink::Sink;

/// Default element type for parts that forward values without inspecting them.
pub(crate) fn default_element_type() -> String {
    "interface{}".to_string()
}

/// Go source for the three execution phases of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Implementation {
    /// Runs once, before the instances start
    pub head: String,
    /// Runs once per instance, concurrently
    pub body: String,
    /// Runs once, after all instances finish
    pub tail: String,
}

/// Top-level Go declarations a part needs in the generated file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SupportCode {
    /// Deduplication key; identical keys are emitted once per file
    pub key: String,
    /// Go declarations
    pub code: String,
}

/// The set of pins that are connected to a live channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    bound: BTreeSet<String>,
}

impl Bindings {
    /// Bindings from an explicit set of connected pin names
    pub fn new<I, S>(bound: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bound: bound.into_iter().map(Into::into).collect(),
        }
    }

    /// Bindings where nothing is connected
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the pin is connected
    pub fn is_bound(&self, pin: &str) -> bool {
        self.bound.contains(pin)
    }

    /// Iterate connected pin names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.bound.iter().map(String::as_str)
    }
}

/// Behavior shared by every part variant.
pub trait PartImpl {
    /// Pins in declaration order; the order is the generated parameter order
    fn pins(&self) -> Vec<PinDefinition>;

    /// Head, body and tail Go code
    fn implementation(&self, bindings: &Bindings) -> Implementation;

    /// Go import paths the implementation needs
    fn imports(&self) -> Vec<String> {
        Vec::new()
    }

    /// Extra top-level declarations, for parts that need them
    fn support_code(&self) -> Option<SupportCode> {
        None
    }

    /// Check the configuration after deserialization
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// A part variant that can be listed in a [`crate::PartRegistry`].
pub trait RegisteredPart: PartImpl + Serialize + DeserializeOwned + Into<Part> {
    /// Stable type key used in persisted graphs
    const TYPE_KEY: &'static str;

    /// One-line description for listings
    const DESCRIPTION: &'static str;
}

/// Deserialize and validate a part of a known variant.
///
/// A `null` configuration means "all defaults".
pub(crate) fn construct_part<P: RegisteredPart>(config: serde_json::Value) -> Result<Part> {
    let config = match config {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        other => other,
    };
    let part: P = serde_json::from_value(config).map_err(|e| Error::PartConfig {
        part_type: P::TYPE_KEY.to_string(),
        message: e.to_string(),
    })?;
    part.validate().map_err(|message| Error::PartConfig {
        part_type: P::TYPE_KEY.to_string(),
        message,
    })?;
    Ok(part.into())
}

/// Closed set of part variants
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Free-form Go code
    Code(Code),
    /// Fan-out copy
    Broadcast(Broadcast),
    /// Fan-in merge
    Join(Join),
    /// Predicate routing
    Filter(Filter),
    /// Discard
    Sink(Sink),
    /// HTTP front end
    HttpServer(HttpServer),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $e:expr) => {
        match $self {
            Part::Code($p) => $e,
            Part::Broadcast($p) => $e,
            Part::Join($p) => $e,
            Part::Filter($p) => $e,
            Part::Sink($p) => $e,
            Part::HttpServer($p) => $e,
        }
    };
}

impl Part {
    /// Stable type key
    pub fn type_key(&self) -> &'static str {
        match self {
            Part::Code(_) => Code::TYPE_KEY,
            Part::Broadcast(_) => Broadcast::TYPE_KEY,
            Part::Join(_) => Join::TYPE_KEY,
            Part::Filter(_) => Filter::TYPE_KEY,
            Part::Sink(_) => Sink::TYPE_KEY,
            Part::HttpServer(_) => HttpServer::TYPE_KEY,
        }
    }

    /// Pins in declaration order
    pub fn pins(&self) -> Vec<PinDefinition> {
        dispatch!(self, p => p.pins())
    }

    /// Look up one pin by name
    pub fn pin(&self, name: &str) -> Option<PinDefinition> {
        self.pins().into_iter().find(|p| p.name == name)
    }

    /// Head, body and tail Go code for the given bindings
    pub fn implementation(&self, bindings: &Bindings) -> Implementation {
        dispatch!(self, p => p.implementation(bindings))
    }

    /// Go import paths
    pub fn imports(&self) -> Vec<String> {
        dispatch!(self, p => p.imports())
    }

    /// Optional top-level declarations
    pub fn support_code(&self) -> Option<SupportCode> {
        dispatch!(self, p => p.support_code())
    }

    /// Serialized configuration, as persisted under `"part"`
    pub fn config(&self) -> Result<serde_json::Value> {
        Ok(dispatch!(self, p => serde_json::to_value(p))?)
    }

    /// Replace the configuration, keeping the variant.
    ///
    /// On error the part is left unchanged.
    pub fn update(&mut self, config: serde_json::Value) -> Result<()> {
        let updated = match self {
            Part::Code(_) => construct_part::<Code>(config)?,
            Part::Broadcast(_) => construct_part::<Broadcast>(config)?,
            Part::Join(_) => construct_part::<Join>(config)?,
            Part::Filter(_) => construct_part::<Filter>(config)?,
            Part::Sink(_) => construct_part::<Sink>(config)?,
            Part::HttpServer(_) => construct_part::<HttpServer>(config)?,
        };
        *self = updated;
        Ok(())
    }
}

/// Quote a string as a Go interpreted string literal.
pub fn go_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Indent every non-empty line of `code` by `levels` tabs.
pub fn indent(code: &str, levels: usize) -> String {
    let prefix = "\t".repeat(levels);
    code.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
