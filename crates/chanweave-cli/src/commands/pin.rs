//! Pin commands

use anyhow::Result;

use chanweave_core::Request;
use chanweave_core::api::{ConnectPin, DisconnectPin};

use super::{Workspace, parse_pin_ref};

/// Attach a pin to an existing channel
pub async fn connect(config_path: &str, graph: &str, pin: &str, channel: &str) -> Result<()> {
    let (node, pin) = parse_pin_ref(pin)?;
    let ws = Workspace::open(config_path)?;
    ws.edit(
        graph,
        Request::ConnectPin(ConnectPin {
            node,
            pin,
            channel: channel.to_string(),
        }),
    )
    .await
}

/// Detach a pin from its channel
pub async fn disconnect(config_path: &str, graph: &str, pin: &str) -> Result<()> {
    let (node, pin) = parse_pin_ref(pin)?;
    let ws = Workspace::open(config_path)?;
    ws.edit(graph, Request::DisconnectPin(DisconnectPin { node, pin }))
        .await
}
