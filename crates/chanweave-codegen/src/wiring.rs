//! Channel wiring of the generated program
//!
//! Decides, for a consistent graph, which channels the entry point allocates
//! and what every enabled node receives for each of its pins. A channel is
//! live when at least one enabled node writes to it and at least one enabled
//! node reads from it; pins on any other channel are passed `nil`. A live
//! channel with several writers gets one private channel per writer so each
//! writer can close its own side, and a merge goroutine closes the shared
//! channel once all of them are done.

use std::collections::{BTreeMap, BTreeSet};

use chanweave_core::parts::Bindings;
use chanweave_core::{Direction, Graph, PinRef};

use crate::ident::{channel_ident, node_ident, writer_ident};

/// A live channel allocated by the entry point
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelWiring {
    /// Channel name in the graph
    pub name: String,
    /// Go variable for the shared channel
    pub ident: String,
    /// Element type
    pub ty: String,
    /// Buffer capacity
    pub capacity: u32,
    /// Private writer channels; empty unless the channel has several writers
    pub writers: Vec<String>,
}

/// One parameter of a node function
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Pin name, used as the Go parameter name
    pub pin: String,
    /// Pin direction
    pub direction: Direction,
    /// Element type
    pub ty: String,
    /// Go expression passed by the entry point; `None` means `nil`
    pub arg: Option<String>,
}

impl Param {
    /// Parameter declaration, e.g. `out chan<- int`
    pub fn declaration(&self) -> String {
        match self.direction {
            Direction::Input => format!("{} <-chan {}", self.pin, self.ty),
            Direction::Output => format!("{} chan<- {}", self.pin, self.ty),
        }
    }

    /// Argument expression at the call site
    pub fn argument(&self) -> &str {
        self.arg.as_deref().unwrap_or("nil")
    }
}

/// An enabled node and what it is called with
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWiring {
    /// Node name in the graph
    pub name: String,
    /// Go function name
    pub ident: String,
    /// Parameters in pin order
    pub params: Vec<Param>,
    /// Pins connected to a live channel
    pub bindings: Bindings,
}

impl NodeWiring {
    /// Output pins the node closes after its tail
    pub fn closes(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.direction == Direction::Output && p.arg.is_some())
            .map(|p| p.pin.as_str())
    }
}

/// Complete wiring of a graph
#[derive(Debug, Clone, PartialEq)]
pub struct Wiring {
    /// Live channels, ordered by name
    pub channels: Vec<ChannelWiring>,
    /// Enabled nodes, ordered by name
    pub nodes: Vec<NodeWiring>,
}

impl Wiring {
    /// Compute the wiring of a consistent graph
    pub fn of(graph: &Graph) -> Self {
        let enabled: BTreeSet<&str> = graph
            .nodes()
            .filter(|n| n.enabled)
            .map(|n| n.name.as_str())
            .collect();

        let mut args: BTreeMap<PinRef, String> = BTreeMap::new();
        let mut channels = Vec::new();

        for ch in graph.channels() {
            let mut writers = Vec::new();
            let mut readers = Vec::new();
            for pin in ch.pins.iter().filter(|p| enabled.contains(p.node.as_str())) {
                match graph.pin_definition(pin).map(|d| d.direction) {
                    Some(Direction::Output) => writers.push(pin),
                    Some(Direction::Input) => readers.push(pin),
                    None => {}
                }
            }
            if writers.is_empty() || readers.is_empty() {
                tracing::debug!(
                    "Channel {} has no enabled {}; its pins get nil",
                    ch.name,
                    if writers.is_empty() { "writer" } else { "reader" }
                );
                continue;
            }

            let ident = channel_ident(&ch.name);
            for pin in &readers {
                args.insert((*pin).clone(), ident.clone());
            }
            let private = if writers.len() > 1 {
                writers
                    .iter()
                    .enumerate()
                    .map(|(i, pin)| {
                        let w = writer_ident(&ch.name, i);
                        args.insert((*pin).clone(), w.clone());
                        w
                    })
                    .collect()
            } else {
                args.insert(writers[0].clone(), ident.clone());
                Vec::new()
            };

            channels.push(ChannelWiring {
                name: ch.name.clone(),
                ident,
                ty: ch.ty.clone(),
                capacity: ch.capacity,
                writers: private,
            });
        }

        let nodes = graph
            .nodes()
            .filter(|n| n.enabled)
            .map(|node| {
                let params: Vec<Param> = node
                    .part
                    .pins()
                    .into_iter()
                    .map(|def| Param {
                        arg: args.get(&PinRef::new(&node.name, &def.name)).cloned(),
                        pin: def.name,
                        direction: def.direction,
                        ty: def.ty,
                    })
                    .collect();
                let bindings = Bindings::new(
                    params
                        .iter()
                        .filter(|p| p.arg.is_some())
                        .map(|p| p.pin.clone()),
                );
                NodeWiring {
                    name: node.name.clone(),
                    ident: node_ident(&node.name),
                    params,
                    bindings,
                }
            })
            .collect();

        Self { channels, nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanweave_core::PartRegistry;
    use chanweave_core::api::{ConnectPin, CreateChannel, CreateNode, SetNodeProperties};
    use serde_json::json;

    fn code(dir: &str, pin: &str) -> serde_json::Value {
        json!({"pins": [{"name": pin, "type": "int", "direction": dir}]})
    }

    fn graph() -> Graph {
        let registry = PartRegistry::builtin();
        let mut g = Graph::new("w", "example.com/w", true);
        for (name, dir, pin) in [
            ("A", "output", "out"),
            ("A2", "output", "out"),
            ("B", "input", "in"),
        ] {
            g.create_node(&registry, CreateNode::new(name, "Code", code(dir, pin)))
                .unwrap();
        }
        g.create_channel(CreateChannel {
            name: "c".into(),
            ty: "int".into(),
            capacity: 2,
            anonymous: false,
            node1: "A".into(),
            pin1: "out".into(),
            node2: "B".into(),
            pin2: "in".into(),
        })
        .unwrap();
        g
    }

    #[test]
    fn test_single_writer_uses_shared_channel() {
        let w = Wiring::of(&graph());
        assert_eq!(w.channels.len(), 1);
        assert!(w.channels[0].writers.is_empty());
        let a = &w.nodes[0];
        assert_eq!(a.params[0].argument(), "chan_c");
        assert_eq!(a.params[0].declaration(), "out chan<- int");
        assert_eq!(a.closes().collect::<Vec<_>>(), vec!["out"]);
        // A2 is not connected
        assert_eq!(w.nodes[1].params[0].argument(), "nil");
        assert_eq!(w.nodes[1].closes().count(), 0);
    }

    #[test]
    fn test_fan_in_gets_private_writers() {
        let mut g = graph();
        g.connect_pin(ConnectPin {
            node: "A2".into(),
            pin: "out".into(),
            channel: "c".into(),
        })
        .unwrap();
        let w = Wiring::of(&g);
        assert_eq!(w.channels[0].writers, vec!["chan_c_w0", "chan_c_w1"]);
        assert_eq!(w.nodes[0].params[0].argument(), "chan_c_w0");
        assert_eq!(w.nodes[1].params[0].argument(), "chan_c_w1");
        assert_eq!(w.nodes[2].params[0].argument(), "chan_c");
    }

    #[test]
    fn test_disabled_reader_kills_channel() {
        let registry = PartRegistry::builtin();
        let mut g = graph();
        let (wait, multiplicity) = {
            let b = g.node("B").unwrap();
            (b.wait, b.multiplicity)
        };
        g.set_node_properties(
            &registry,
            SetNodeProperties {
                node: "B".into(),
                name: "B".into(),
                enabled: false,
                wait,
                multiplicity,
                part_type: "Code".into(),
                part: code("input", "in"),
                x: 0,
                y: 0,
            },
        )
        .unwrap();
        let w = Wiring::of(&g);
        assert!(w.channels.is_empty());
        assert_eq!(w.nodes.len(), 2);
        assert!(w.nodes.iter().all(|n| n.params[0].arg.is_none()));
    }
}
