//! Node commands

use anyhow::{Context, Result};

use chanweave_core::Request;
use chanweave_core::api::{CreateNode, DeleteNode, SetNodeProperties, SetPosition};

use super::{Workspace, parse_part};

/// Options for `node add`
pub struct AddOptions<'a> {
    /// Part configuration as JSON
    pub part: Option<&'a str>,
    /// Concurrent body instances
    pub multiplicity: u32,
    /// Create the node disabled
    pub disabled: bool,
    /// Do not wait for the node in the entry point
    pub no_wait: bool,
    /// Layout x
    pub x: i64,
    /// Layout y
    pub y: i64,
}

/// Add a node
pub async fn add(
    config_path: &str,
    graph: &str,
    name: &str,
    part_type: &str,
    options: AddOptions<'_>,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let req = CreateNode {
        name: name.to_string(),
        part_type: part_type.to_string(),
        part: parse_part(options.part)?,
        enabled: !options.disabled,
        wait: !options.no_wait,
        multiplicity: options.multiplicity,
        x: options.x,
        y: options.y,
    };
    ws.edit(graph, Request::CreateNode(req)).await
}

/// Remove a node and detach its pins
pub async fn rm(config_path: &str, graph: &str, name: &str) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    ws.edit(
        graph,
        Request::DeleteNode(DeleteNode {
            node: name.to_string(),
        }),
    )
    .await
}

/// Changes for `node set`; `None` keeps the current value
#[derive(Default)]
pub struct SetOptions<'a> {
    /// New name
    pub rename: Option<&'a str>,
    /// New part type
    pub part_type: Option<&'a str>,
    /// New part configuration as JSON
    pub part: Option<&'a str>,
    /// Enabled flag
    pub enabled: Option<bool>,
    /// Wait flag
    pub wait: Option<bool>,
    /// Concurrent body instances
    pub multiplicity: Option<u32>,
}

/// Change node properties
pub async fn set(
    config_path: &str,
    graph: &str,
    name: &str,
    options: SetOptions<'_>,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let key = ws.load(graph).await?;

    let new_part = match options.part {
        Some(_) => Some(parse_part(options.part)?),
        None => None,
    };
    let req = ws
        .store
        .read(&key, |g| {
            let node = g.node(name)?;
            let part = match new_part {
                Some(part) => Ok(part),
                None => node.part.config(),
            };
            Some(part.map(|part| SetNodeProperties {
                node: name.to_string(),
                name: options.rename.unwrap_or(name).to_string(),
                enabled: options.enabled.unwrap_or(node.enabled),
                wait: options.wait.unwrap_or(node.wait),
                multiplicity: options.multiplicity.unwrap_or(node.multiplicity),
                part_type: options
                    .part_type
                    .unwrap_or(node.part.type_key())
                    .to_string(),
                part,
                x: node.x,
                y: node.y,
            }))
        })
        .await?
        .ok_or_else(|| anyhow::anyhow!("Node '{}' not found in graph '{}'", name, graph))??;

    ws.store
        .set_node_properties(&key, req)
        .await
        .with_context(|| format!("SetNodeProperties failed on graph '{}'", graph))?;
    ws.store
        .save(&key)
        .await
        .with_context(|| format!("Failed to save graph '{}'", graph))?;
    tracing::info!("✓ Updated node {}", options.rename.unwrap_or(name));
    Ok(())
}

/// Move a node
pub async fn move_to(config_path: &str, graph: &str, name: &str, x: i64, y: i64) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    ws.edit(
        graph,
        Request::SetPosition(SetPosition {
            node: name.to_string(),
            x,
            y,
        }),
    )
    .await
}
