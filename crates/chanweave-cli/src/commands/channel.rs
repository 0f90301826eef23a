//! Channel commands

use anyhow::Result;

use chanweave_core::Request;
use chanweave_core::api::{CreateChannel, DeleteChannel};

use super::{Workspace, parse_pin_ref};

/// Create a channel between two pins
pub async fn add(
    config_path: &str,
    graph: &str,
    name: &str,
    from: &str,
    to: &str,
    ty: &str,
    capacity: u32,
) -> Result<()> {
    let (node1, pin1) = parse_pin_ref(from)?;
    let (node2, pin2) = parse_pin_ref(to)?;
    let ws = Workspace::open(config_path)?;
    ws.edit(
        graph,
        Request::CreateChannel(CreateChannel {
            name: name.to_string(),
            ty: ty.to_string(),
            capacity,
            anonymous: false,
            node1,
            pin1,
            node2,
            pin2,
        }),
    )
    .await
}

/// Delete a channel, unbinding its pins
pub async fn rm(config_path: &str, graph: &str, name: &str) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    ws.edit(
        graph,
        Request::DeleteChannel(DeleteChannel {
            channel: name.to_string(),
        }),
    )
    .await
}
