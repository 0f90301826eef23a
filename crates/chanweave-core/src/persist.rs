//! JSON graph file format
//!
//! ```json
//! {
//!   "name": "demo", "package_path": "example.com/demo", "is_command": true,
//!   "nodes": {
//!     "Generate": {
//!       "part_type": "Code", "part": { ... },
//!       "enabled": true, "wait": true, "multiplicity": 1, "x": 0, "y": 0,
//!       "connections": { "out": "numbers" }
//!     }
//!   },
//!   "channels": { "numbers": { "type": "int", "cap": 0 } }
//! }
//! ```
//!
//! Channels do not store their pins; membership is rebuilt from the nodes'
//! connections when a graph is loaded.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::graph::{Channel, Graph, NIL, Node, PinRef, validate_multiplicity, validate_name};
use crate::registry::PartRegistry;

#[derive(Debug, Serialize, Deserialize)]
struct GraphFile {
    name: String,
    #[serde(default)]
    package_path: String,
    #[serde(default)]
    is_command: bool,
    #[serde(default)]
    nodes: BTreeMap<String, NodeFile>,
    #[serde(default)]
    channels: BTreeMap<String, ChannelFile>,
}

fn default_true() -> bool {
    true
}

fn default_multiplicity() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeFile {
    part_type: String,
    #[serde(default)]
    part: serde_json::Value,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_true")]
    wait: bool,
    #[serde(default = "default_multiplicity")]
    multiplicity: u32,
    #[serde(default)]
    x: i64,
    #[serde(default)]
    y: i64,
    #[serde(default)]
    connections: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChannelFile {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    cap: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    anonymous: bool,
}

impl Graph {
    /// Serialize to the persisted JSON form (pretty-printed, keys sorted).
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut nodes = BTreeMap::new();
        for node in self.nodes() {
            nodes.insert(
                node.name.clone(),
                NodeFile {
                    part_type: node.part.type_key().to_string(),
                    part: node.part.config()?,
                    enabled: node.enabled,
                    wait: node.wait,
                    multiplicity: node.multiplicity,
                    x: node.x,
                    y: node.y,
                    connections: node
                        .connections
                        .iter()
                        .map(|(pin, ch)| (pin.clone(), ch.clone().unwrap_or_else(|| NIL.to_string())))
                        .collect(),
                },
            );
        }
        let channels = self
            .channels()
            .map(|ch| {
                (
                    ch.name.clone(),
                    ChannelFile {
                        ty: ch.ty.clone(),
                        cap: ch.capacity,
                        anonymous: ch.anonymous,
                    },
                )
            })
            .collect();

        let file = GraphFile {
            name: self.name.clone(),
            package_path: self.package_path.clone(),
            is_command: self.is_command,
            nodes,
            channels,
        };
        let mut bytes = serde_json::to_vec_pretty(&file)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse the persisted JSON form, rebuild channel membership and verify
    /// every invariant.
    pub fn from_json(bytes: &[u8], registry: &PartRegistry) -> Result<Graph> {
        let file: GraphFile = serde_json::from_slice(bytes)?;
        let mut problems = Vec::new();

        for name in file.channels.keys() {
            if let Err(e) = validate_name(name) {
                problems.push(format!("channel key: {}", e));
            }
        }

        let mut channels: BTreeMap<String, Channel> = file
            .channels
            .into_iter()
            .map(|(name, ch)| {
                (
                    name.clone(),
                    Channel {
                        name,
                        ty: ch.ty,
                        capacity: ch.cap,
                        anonymous: ch.anonymous,
                        pins: BTreeSet::new(),
                    },
                )
            })
            .collect();

        let mut nodes = BTreeMap::new();
        for (name, raw) in file.nodes {
            if let Err(e) = validate_name(&name) {
                problems.push(format!("node key: {}", e));
            }
            if let Err(e) = validate_multiplicity(raw.multiplicity) {
                problems.push(format!("node '{}': {}", name, e));
            }
            let part = registry.construct(&raw.part_type, raw.part)?;
            let mut node = Node::new(name.clone(), part);
            node.enabled = raw.enabled;
            node.wait = raw.wait;
            node.multiplicity = raw.multiplicity;
            node.x = raw.x;
            node.y = raw.y;

            for (pin, channel) in raw.connections {
                if channel == NIL {
                    if !node.connections.contains_key(&pin) {
                        tracing::debug!(node = %name, pin = %pin, "dropping stale unbound pin");
                    }
                    continue;
                }
                if !node.connections.contains_key(&pin) {
                    problems.push(format!(
                        "node '{}' binds unknown pin '{}' to '{}'",
                        name, pin, channel
                    ));
                    continue;
                }
                match channels.get_mut(&channel) {
                    Some(ch) => {
                        ch.pins.insert(PinRef::new(&name, &pin));
                        node.connections.insert(pin, Some(channel));
                    }
                    None => problems.push(format!(
                        "pin '{}.{}' refers to unknown channel '{}'",
                        name, pin, channel
                    )),
                }
            }
            nodes.insert(name, node);
        }

        let graph = Graph::from_raw(
            file.name,
            file.package_path,
            file.is_command,
            nodes,
            channels,
        );
        problems.extend(graph.check_consistency());
        if !problems.is_empty() {
            return Err(Error::Inconsistent {
                graph: graph.name,
                problems,
            });
        }
        Ok(graph)
    }
}
