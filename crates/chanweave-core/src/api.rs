//! Request surface of the graph store
//!
//! Each mutation has a request struct; [`Request`] tags them with an `op`
//! field so they can arrive as JSON:
//!
//! ```json
//! {"op": "ConnectPin", "node": "Sink", "pin": "input", "channel": "numbers"}
//! ```

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_multiplicity() -> u32 {
    1
}

/// Create a node with every pin unbound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNode {
    /// Node name
    pub name: String,
    /// Part type key
    pub part_type: String,
    /// Part configuration
    #[serde(default)]
    pub part: serde_json::Value,
    /// Whether the node is generated at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the entry point waits for the node
    #[serde(default = "default_true")]
    pub wait: bool,
    /// Number of concurrent body instances
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,
    /// Layout x
    #[serde(default)]
    pub x: i64,
    /// Layout y
    #[serde(default)]
    pub y: i64,
}

impl CreateNode {
    /// Request for an enabled, waited, single-instance node at the origin
    pub fn new(
        name: impl Into<String>,
        part_type: impl Into<String>,
        part: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            part_type: part_type.into(),
            part,
            enabled: true,
            wait: true,
            multiplicity: 1,
            x: 0,
            y: 0,
        }
    }
}

/// Create a channel between two pins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChannel {
    /// Channel name
    pub name: String,
    /// Element type
    #[serde(rename = "type")]
    pub ty: String,
    /// Buffer capacity (0 = unbuffered)
    #[serde(default, rename = "cap")]
    pub capacity: u32,
    /// Created implicitly by a pin-to-pin connection
    #[serde(default)]
    pub anonymous: bool,
    /// First node
    pub node1: String,
    /// Pin on the first node
    pub pin1: String,
    /// Second node
    pub node2: String,
    /// Pin on the second node
    pub pin2: String,
}

/// Attach a pin to an existing channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectPin {
    /// Node name
    pub node: String,
    /// Pin name
    pub pin: String,
    /// Channel name
    pub channel: String,
}

/// Detach a pin from its channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectPin {
    /// Node name
    pub node: String,
    /// Pin name
    pub pin: String,
}

/// Delete a node and detach its pins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNode {
    /// Node name
    pub node: String,
}

/// Delete a channel and unbind its pins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteChannel {
    /// Channel name
    pub channel: String,
}

/// Replace a node's properties and part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetNodeProperties {
    /// Current node name
    pub node: String,
    /// New node name (may equal `node`)
    pub name: String,
    /// Whether the node is generated at all
    pub enabled: bool,
    /// Whether the entry point waits for the node
    pub wait: bool,
    /// Number of concurrent body instances
    pub multiplicity: u32,
    /// Part type key
    pub part_type: String,
    /// Part configuration
    #[serde(default)]
    pub part: serde_json::Value,
    /// Layout x
    #[serde(default)]
    pub x: i64,
    /// Layout y
    #[serde(default)]
    pub y: i64,
}

/// Move a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPosition {
    /// Node name
    pub node: String,
    /// Layout x
    pub x: i64,
    /// Layout y
    pub y: i64,
}

/// Replace graph metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetGraphProperties {
    /// Graph name
    pub name: String,
    /// Go package path
    pub package_path: String,
    /// Generate `package main` with `func main()`
    pub is_command: bool,
}

/// Any store request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    /// See [`CreateNode`]
    CreateNode(CreateNode),
    /// See [`CreateChannel`]
    CreateChannel(CreateChannel),
    /// See [`ConnectPin`]
    ConnectPin(ConnectPin),
    /// See [`DisconnectPin`]
    DisconnectPin(DisconnectPin),
    /// See [`DeleteNode`]
    DeleteNode(DeleteNode),
    /// See [`DeleteChannel`]
    DeleteChannel(DeleteChannel),
    /// See [`SetNodeProperties`]
    SetNodeProperties(SetNodeProperties),
    /// See [`SetGraphProperties`]
    SetGraphProperties(SetGraphProperties),
    /// See [`SetPosition`]
    SetPosition(SetPosition),
    /// Persist the graph
    Save,
}

impl Request {
    /// Operation name, as it appears in the `op` field
    pub fn op(&self) -> &'static str {
        match self {
            Request::CreateNode(_) => "CreateNode",
            Request::CreateChannel(_) => "CreateChannel",
            Request::ConnectPin(_) => "ConnectPin",
            Request::DisconnectPin(_) => "DisconnectPin",
            Request::DeleteNode(_) => "DeleteNode",
            Request::DeleteChannel(_) => "DeleteChannel",
            Request::SetNodeProperties(_) => "SetNodeProperties",
            Request::SetGraphProperties(_) => "SetGraphProperties",
            Request::SetPosition(_) => "SetPosition",
            Request::Save => "Save",
        }
    }
}
