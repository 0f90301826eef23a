//! Graph-level commands

use anyhow::{Context, Result};

use chanweave_core::Graph;
use chanweave_core::api::SetGraphProperties;
use chanweave_core::backend::{FileBackend, Persistence};

use super::{Workspace, graph_key, graph_stem};

/// Create an empty graph file
pub async fn new(
    config_path: &str,
    graph: &str,
    package_path: Option<&str>,
    command: bool,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let key = graph_key(graph);
    let backend = FileBackend::new(ws.config.graphs_path());
    let path = backend.path(&key)?;
    if backend.exists(&key).await? {
        anyhow::bail!("Graph '{}' already exists at {}", graph, path.display());
    }

    let name = graph_stem(&key);
    let package_path = package_path
        .map(str::to_string)
        .unwrap_or_else(|| format!("example.com/{}", name));
    ws.store
        .create_graph(&key, Graph::new(name, package_path, command))
        .await?;
    ws.store
        .save(&key)
        .await
        .with_context(|| format!("Failed to save graph '{}'", graph))?;

    tracing::info!("✓ Created graph {}", path.display());
    Ok(())
}

/// Print a graph, as a summary or as its JSON file
pub async fn show(config_path: &str, graph: &str, as_json: bool) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let key = ws.load(graph).await?;

    let text = ws
        .store
        .read(&key, |g| {
            if as_json {
                g.to_json()
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            } else {
                Ok(summary(g))
            }
        })
        .await??;
    print!("{}", text);
    Ok(())
}

fn summary(g: &Graph) -> String {
    let mut out = String::new();
    out.push_str(&format!("Graph: {}\n", g.name));
    out.push_str(&format!("Package: {}\n", g.package_path));
    out.push_str(&format!(
        "Kind: {}\n",
        if g.is_command { "command" } else { "library" }
    ));

    out.push_str(&format!("\nNodes ({}):\n", g.node_count()));
    for node in g.nodes() {
        let mut flags = Vec::new();
        if !node.enabled {
            flags.push("disabled".to_string());
        }
        if !node.wait {
            flags.push("no-wait".to_string());
        }
        if node.multiplicity > 1 {
            flags.push(format!("x{}", node.multiplicity));
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        out.push_str(&format!("  {} ({}){}\n", node.name, node.part.type_key(), flags));
        for pin in node.part.pins() {
            out.push_str(&format!(
                "    {} {} {} -> {}\n",
                pin.direction,
                pin.name,
                pin.ty,
                node.binding(&pin.name).unwrap_or(chanweave_core::graph::NIL)
            ));
        }
    }

    out.push_str(&format!("\nChannels ({}):\n", g.channel_count()));
    for ch in g.channels() {
        let pins: Vec<String> = ch.pins.iter().map(|p| p.to_string()).collect();
        out.push_str(&format!(
            "  {} chan {} (cap {}): {}\n",
            ch.name,
            ch.ty,
            ch.capacity,
            pins.join(", ")
        ));
    }
    out
}

/// Change graph metadata; unspecified fields keep their value
pub async fn set(
    config_path: &str,
    graph: &str,
    name: Option<&str>,
    package_path: Option<&str>,
    command: Option<bool>,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let key = ws.load(graph).await?;
    let req = ws
        .store
        .read(&key, |g| SetGraphProperties {
            name: name.map(str::to_string).unwrap_or_else(|| g.name.clone()),
            package_path: package_path
                .map(str::to_string)
                .unwrap_or_else(|| g.package_path.clone()),
            is_command: command.unwrap_or(g.is_command),
        })
        .await?;
    ws.store.set_graph_properties(&key, req).await?;
    ws.store
        .save(&key)
        .await
        .with_context(|| format!("Failed to save graph '{}'", graph))?;
    tracing::info!("✓ Updated graph {}", key);
    Ok(())
}

/// Load and verify one graph, or every graph in the project
pub async fn check(config_path: &str, graph: Option<&str>) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let keys = match graph {
        Some(g) => vec![graph_key(g)],
        None => ws.discover(),
    };
    if keys.is_empty() {
        tracing::info!("No graphs in {}", ws.config.graphs_path().display());
        return Ok(());
    }

    let results = futures::future::join_all(keys.iter().map(|k| ws.store.load(k))).await;
    let mut failed = 0;
    for (key, result) in keys.iter().zip(results) {
        match result {
            Ok(()) => tracing::info!("✓ {}", key),
            Err(e) => {
                failed += 1;
                tracing::error!("✗ {}: {}", key, e);
                if let chanweave_core::Error::Inconsistent { problems, .. } = &e {
                    for problem in problems {
                        tracing::error!("    {}", problem);
                    }
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} graphs failed verification", failed, keys.len());
    }
    tracing::info!("✓ All {} graphs are consistent", keys.len());
    Ok(())
}
