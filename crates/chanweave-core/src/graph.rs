//! Graph model: nodes, channels and the mutations that keep them in sync
//!
//! Nodes and channels reference each other by name. A node's `connections`
//! map says which channel each of its pins is bound to; a channel's `pins`
//! set lists the `(node, pin)` pairs attached to it. Every mutation keeps the
//! two sides mirrored, and validates everything before touching either side,
//! so a failed call leaves the graph exactly as it was.
//!
//! A channel at rest either has no pins or has at least two pins on distinct
//! nodes, with at least one input and one output among them, all of the
//! channel's element type.

use std::collections::{BTreeMap, BTreeSet};

use crate::api::{
    ConnectPin, CreateChannel, CreateNode, DeleteChannel, DeleteNode, DisconnectPin,
    SetGraphProperties, SetNodeProperties, SetPosition,
};
use crate::error::{Error, Result};
use crate::parts::Part;
use crate::pin::{Direction, PinDefinition};
use crate::registry::PartRegistry;

/// Sentinel used in persisted connections for an unbound pin
pub const NIL: &str = "nil";

/// A `(node, pin)` pair attached to a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinRef {
    /// Node name
    pub node: String,
    /// Pin name
    pub pin: String,
}

impl PinRef {
    /// Create a pin reference
    pub fn new(node: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            pin: pin.into(),
        }
    }
}

impl std::fmt::Display for PinRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node, self.pin)
    }
}

/// A processing unit wrapping a part
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique name within the graph
    pub name: String,
    /// Disabled nodes are left out of generated code
    pub enabled: bool,
    /// Number of concurrent body instances (at least 1)
    pub multiplicity: u32,
    /// Whether the entry point waits for this node
    pub wait: bool,
    /// Layout x
    pub x: i64,
    /// Layout y
    pub y: i64,
    /// The node's behavior
    pub part: Part,
    /// Pin name → bound channel, one entry per pin of `part`
    pub connections: BTreeMap<String, Option<String>>,
}

impl Node {
    /// A node with every pin unbound
    pub fn new(name: impl Into<String>, part: Part) -> Self {
        let connections = part.pins().into_iter().map(|p| (p.name, None)).collect();
        Self {
            name: name.into(),
            enabled: true,
            multiplicity: 1,
            wait: true,
            x: 0,
            y: 0,
            part,
            connections,
        }
    }

    /// Channel the pin is bound to, if any
    pub fn binding(&self, pin: &str) -> Option<&str> {
        self.connections.get(pin).and_then(|c| c.as_deref())
    }

    /// `(pin, channel)` for every bound pin
    pub fn bound_pins(&self) -> impl Iterator<Item = (&str, &str)> {
        self.connections
            .iter()
            .filter_map(|(pin, ch)| ch.as_deref().map(|c| (pin.as_str(), c)))
    }
}

/// A typed connection point between pins
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Unique name within the graph
    pub name: String,
    /// Go element type
    pub ty: String,
    /// Buffer capacity (0 = unbuffered)
    pub capacity: u32,
    /// Created implicitly by a pin-to-pin connection
    pub anonymous: bool,
    /// Attached pins
    pub pins: BTreeSet<PinRef>,
}

/// A pipeline graph
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Go package path of the generated code
    pub package_path: String,
    /// Generate a command (`package main`) rather than a library
    pub is_command: bool,
    nodes: BTreeMap<String, Node>,
    channels: BTreeMap<String, Channel>,
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if name == NIL {
        return Err(Error::InvalidName {
            name: name.to_string(),
            reason: "reserved for unbound pins".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_multiplicity(multiplicity: u32) -> Result<()> {
    if multiplicity == 0 {
        return Err(Error::InvalidArgument(
            "multiplicity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl Graph {
    /// An empty graph
    pub fn new(
        name: impl Into<String>,
        package_path: impl Into<String>,
        is_command: bool,
    ) -> Self {
        Self {
            name: name.into(),
            package_path: package_path.into(),
            is_command,
            nodes: BTreeMap::new(),
            channels: BTreeMap::new(),
        }
    }

    /// Assemble a graph from parts, for the persistence layer
    pub(crate) fn from_raw(
        name: String,
        package_path: String,
        is_command: bool,
        nodes: BTreeMap<String, Node>,
        channels: BTreeMap<String, Channel>,
    ) -> Self {
        Self {
            name,
            package_path,
            is_command,
            nodes,
            channels,
        }
    }

    /// Nodes ordered by name
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Channels ordered by name
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Look up a node
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Look up a channel
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Definition of an attached pin
    pub fn pin_definition(&self, pin: &PinRef) -> Option<PinDefinition> {
        self.nodes.get(&pin.node).and_then(|n| n.part.pin(&pin.pin))
    }

    fn require_node(&self, name: &str) -> Result<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| Error::NodeNotFound(name.to_string()))
    }

    fn require_pin(&self, node: &str, pin: &str) -> Result<PinDefinition> {
        let n = self.require_node(node)?;
        n.part.pin(pin).ok_or_else(|| Error::PinNotFound {
            node: node.to_string(),
            pin: pin.to_string(),
        })
    }

    fn require_unbound(&self, node: &str, pin: &str) -> Result<()> {
        match self.nodes.get(node).and_then(|n| n.binding(pin)) {
            Some(channel) => Err(Error::PinAlreadyBound {
                node: node.to_string(),
                pin: pin.to_string(),
                channel: channel.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn check_type(&self, node: &str, pin: &PinDefinition, channel: &str, ty: &str) -> Result<()> {
        if pin.ty != ty {
            return Err(Error::TypeMismatch {
                node: node.to_string(),
                pin: pin.name.clone(),
                pin_type: pin.ty.clone(),
                channel: channel.to_string(),
                channel_type: ty.to_string(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a node with every pin unbound.
    pub fn create_node(&mut self, registry: &PartRegistry, req: CreateNode) -> Result<()> {
        validate_name(&req.name)?;
        if self.nodes.contains_key(&req.name) {
            return Err(Error::NodeExists(req.name));
        }
        validate_multiplicity(req.multiplicity)?;
        let part = registry.construct(&req.part_type, req.part)?;

        let mut node = Node::new(req.name.clone(), part);
        node.enabled = req.enabled;
        node.wait = req.wait;
        node.multiplicity = req.multiplicity;
        node.x = req.x;
        node.y = req.y;

        tracing::debug!(graph = %self.name, node = %req.name, "created node");
        self.nodes.insert(req.name, node);
        Ok(())
    }

    /// Create a channel and bind both pins to it.
    pub fn create_channel(&mut self, req: CreateChannel) -> Result<()> {
        let def1 = self.require_pin(&req.node1, &req.pin1)?;
        let def2 = self.require_pin(&req.node2, &req.pin2)?;
        self.require_unbound(&req.node1, &req.pin1)?;
        self.require_unbound(&req.node2, &req.pin2)?;
        validate_name(&req.name)?;
        if self.channels.contains_key(&req.name) {
            return Err(Error::ChannelExists(req.name));
        }
        if req.node1 == req.node2 {
            return Err(Error::SelfLoop {
                node: req.node1,
                channel: req.name,
            });
        }
        self.check_type(&req.node1, &def1, &req.name, &req.ty)?;
        self.check_type(&req.node2, &def2, &req.name, &req.ty)?;
        if def1.direction == def2.direction {
            return Err(Error::DirectionConflict { channel: req.name });
        }

        let pins = BTreeSet::from([
            PinRef::new(&req.node1, &req.pin1),
            PinRef::new(&req.node2, &req.pin2),
        ]);
        self.bind(&req.node1, &req.pin1, &req.name);
        self.bind(&req.node2, &req.pin2, &req.name);
        tracing::debug!(graph = %self.name, channel = %req.name, "created channel");
        self.channels.insert(
            req.name.clone(),
            Channel {
                name: req.name,
                ty: req.ty,
                capacity: req.capacity,
                anonymous: req.anonymous,
                pins,
            },
        );
        Ok(())
    }

    /// Attach a pin to an existing channel.
    pub fn connect_pin(&mut self, req: ConnectPin) -> Result<()> {
        let def = self.require_pin(&req.node, &req.pin)?;
        let channel = self
            .channels
            .get(&req.channel)
            .ok_or_else(|| Error::ChannelNotFound(req.channel.clone()))?;
        self.require_unbound(&req.node, &req.pin)?;
        if channel.pins.iter().any(|p| p.node == req.node) {
            return Err(Error::SelfLoop {
                node: req.node,
                channel: req.channel,
            });
        }
        self.check_type(&req.node, &def, &req.channel, &channel.ty)?;

        self.bind(&req.node, &req.pin, &req.channel);
        if let Some(channel) = self.channels.get_mut(&req.channel) {
            channel.pins.insert(PinRef::new(&req.node, &req.pin));
        }
        tracing::debug!(graph = %self.name, pin = %format!("{}.{}", req.node, req.pin), channel = %req.channel, "connected pin");
        Ok(())
    }

    /// Detach a pin; deletes the channel if it is left without a reader and
    /// a writer on two distinct pins.
    pub fn disconnect_pin(&mut self, req: DisconnectPin) -> Result<()> {
        self.require_pin(&req.node, &req.pin)?;
        let Some(channel) = self.nodes[&req.node].binding(&req.pin).map(str::to_string) else {
            return Ok(());
        };
        self.detach(&req.node, &req.pin, &channel);
        tracing::debug!(graph = %self.name, pin = %format!("{}.{}", req.node, req.pin), channel = %channel, "disconnected pin");
        Ok(())
    }

    /// Delete a channel, unbinding every attached pin.
    pub fn delete_channel(&mut self, req: DeleteChannel) -> Result<()> {
        if !self.channels.contains_key(&req.channel) {
            return Err(Error::ChannelNotFound(req.channel));
        }
        self.remove_channel(&req.channel);
        Ok(())
    }

    /// Delete a node, detaching all its pins first.
    pub fn delete_node(&mut self, req: DeleteNode) -> Result<()> {
        let node = self.require_node(&req.node)?;
        let bound: Vec<(String, String)> = node
            .bound_pins()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        for (pin, channel) in bound {
            self.detach(&req.node, &pin, &channel);
        }
        self.nodes.remove(&req.node);
        tracing::debug!(graph = %self.name, node = %req.node, "deleted node");
        Ok(())
    }

    /// Replace a node's properties and part, optionally renaming it.
    ///
    /// Connected pins must survive the change with the same type and
    /// direction; otherwise the caller has to disconnect them first.
    pub fn set_node_properties(
        &mut self,
        registry: &PartRegistry,
        req: SetNodeProperties,
    ) -> Result<()> {
        let node = self.require_node(&req.node)?;
        validate_name(&req.name)?;
        if req.name != req.node && self.nodes.contains_key(&req.name) {
            return Err(Error::NodeExists(req.name));
        }
        validate_multiplicity(req.multiplicity)?;
        let part = registry.construct(&req.part_type, req.part)?;

        let new_pins: BTreeMap<String, PinDefinition> = part
            .pins()
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        for (pin, _) in node.bound_pins() {
            let old = node.part.pin(pin);
            let kept = match (old, new_pins.get(pin)) {
                (Some(old), Some(new)) => old.ty == new.ty && old.direction == new.direction,
                _ => false,
            };
            if !kept {
                return Err(Error::BoundPinChanged {
                    node: req.node,
                    pin: pin.to_string(),
                });
            }
        }

        let Some(mut node) = self.nodes.remove(&req.node) else {
            return Err(Error::NodeNotFound(req.node));
        };
        node.connections = new_pins
            .keys()
            .map(|pin| (pin.clone(), node.connections.get(pin).cloned().flatten()))
            .collect();
        node.part = part;
        node.enabled = req.enabled;
        node.wait = req.wait;
        node.multiplicity = req.multiplicity;
        node.x = req.x;
        node.y = req.y;

        if req.name != req.node {
            for (pin, channel) in node.bound_pins() {
                if let Some(ch) = self.channels.get_mut(channel) {
                    ch.pins.remove(&PinRef::new(&req.node, pin));
                    ch.pins.insert(PinRef::new(&req.name, pin));
                }
            }
            node.name = req.name.clone();
            tracing::debug!(graph = %self.name, from = %req.node, to = %req.name, "renamed node");
        }
        self.nodes.insert(req.name, node);
        Ok(())
    }

    /// Move a node.
    pub fn set_position(&mut self, req: SetPosition) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&req.node)
            .ok_or_else(|| Error::NodeNotFound(req.node.clone()))?;
        node.x = req.x;
        node.y = req.y;
        Ok(())
    }

    /// Replace graph metadata.
    pub fn set_properties(&mut self, req: SetGraphProperties) {
        self.name = req.name;
        self.package_path = req.package_path;
        self.is_command = req.is_command;
    }

    // ------------------------------------------------------------------
    // Internal helpers; callers have already validated
    // ------------------------------------------------------------------

    fn bind(&mut self, node: &str, pin: &str, channel: &str) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.connections
                .insert(pin.to_string(), Some(channel.to_string()));
        }
    }

    fn unbind(&mut self, node: &str, pin: &str) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.connections.insert(pin.to_string(), None);
        }
    }

    fn detach(&mut self, node: &str, pin: &str, channel: &str) {
        self.unbind(node, pin);
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.pins.remove(&PinRef::new(node, pin));
        }
        if !self.channel_is_viable(channel) {
            tracing::debug!(graph = %self.name, channel = %channel, "channel lost its last reader or writer, removing");
            self.remove_channel(channel);
        }
    }

    fn channel_is_viable(&self, channel: &str) -> bool {
        let Some(ch) = self.channels.get(channel) else {
            return true;
        };
        if ch.pins.len() < 2 {
            return false;
        }
        let directions: BTreeSet<Direction> = ch
            .pins
            .iter()
            .filter_map(|p| self.pin_definition(p))
            .map(|d| d.direction)
            .collect();
        directions.len() == 2
    }

    fn remove_channel(&mut self, channel: &str) {
        if let Some(ch) = self.channels.remove(channel) {
            for pin in &ch.pins {
                self.unbind(&pin.node, &pin.pin);
            }
            tracing::debug!(graph = %self.name, channel = %channel, "deleted channel");
        }
    }

    // ------------------------------------------------------------------
    // Consistency
    // ------------------------------------------------------------------

    /// Every violation of the graph invariants, as human-readable problems.
    ///
    /// An empty result means the node/channel mirror is intact and every
    /// channel is well formed.
    pub fn check_consistency(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (key, node) in &self.nodes {
            if key != &node.name {
                problems.push(format!("node '{}' stored under key '{}'", node.name, key));
            }
            let pins: BTreeSet<String> = node.part.pins().into_iter().map(|p| p.name).collect();
            let keys: BTreeSet<String> = node.connections.keys().cloned().collect();
            if pins != keys {
                problems.push(format!(
                    "node '{}' connections {:?} do not match pins {:?}",
                    node.name, keys, pins
                ));
            }
            for (pin, channel) in node.bound_pins() {
                match self.channels.get(channel) {
                    None => problems.push(format!(
                        "pin '{}.{}' is bound to missing channel '{}'",
                        node.name, pin, channel
                    )),
                    Some(ch) if !ch.pins.contains(&PinRef::new(&node.name, pin)) => {
                        problems.push(format!(
                            "pin '{}.{}' is bound to '{}' but the channel does not list it",
                            node.name, pin, channel
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        for (key, ch) in &self.channels {
            if key != &ch.name {
                problems.push(format!("channel '{}' stored under key '{}'", ch.name, key));
            }
            if ch.pins.is_empty() {
                continue;
            }
            if ch.pins.len() < 2 {
                problems.push(format!("channel '{}' has fewer than 2 pins", ch.name));
            }
            let mut directions = BTreeSet::new();
            let mut owners = BTreeSet::new();
            for pin in &ch.pins {
                if !owners.insert(pin.node.as_str()) {
                    problems.push(format!(
                        "channel '{}' has several pins on node '{}'",
                        ch.name, pin.node
                    ));
                }
                let Some(node) = self.nodes.get(&pin.node) else {
                    problems.push(format!(
                        "channel '{}' lists pin '{}' of missing node",
                        ch.name, pin
                    ));
                    continue;
                };
                if node.binding(&pin.pin) != Some(ch.name.as_str()) {
                    problems.push(format!(
                        "channel '{}' lists pin '{}' which is not bound to it",
                        ch.name, pin
                    ));
                }
                match node.part.pin(&pin.pin) {
                    None => problems.push(format!(
                        "channel '{}' lists missing pin '{}'",
                        ch.name, pin
                    )),
                    Some(def) => {
                        if def.ty != ch.ty {
                            problems.push(format!(
                                "pin '{}' has type '{}' but channel '{}' has type '{}'",
                                pin, def.ty, ch.name, ch.ty
                            ));
                        }
                        directions.insert(def.direction);
                    }
                }
            }
            if directions.len() < 2 {
                problems.push(format!(
                    "channel '{}' lacks an input or an output pin",
                    ch.name
                ));
            }
        }

        problems
    }

    /// Fail with [`Error::Inconsistent`] if the checker finds anything.
    pub fn ensure_consistent(&self) -> Result<()> {
        let problems = self.check_consistency();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Inconsistent {
                graph: self.name.clone(),
                problems,
            })
        }
    }
}
