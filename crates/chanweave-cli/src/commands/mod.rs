//! CLI command implementations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chanweave_core::backend::FileBackend;
use chanweave_core::{Config, GraphStore, PartRegistry, Request};

pub mod apply;
pub mod channel;
pub mod generate;
pub mod graph;
pub mod init;
pub mod node;
pub mod parts;
pub mod pin;

/// Extension of graph files
pub const GRAPH_EXTENSION: &str = "json";

/// A project opened from its configuration, with a store over its graphs
pub struct Workspace {
    /// Project configuration
    pub config: Config,
    /// Store rooted at the graphs directory
    pub store: GraphStore,
}

impl Workspace {
    /// Open the project at `config_path`, using defaults when there is no
    /// configuration file
    pub fn open(config_path: &str) -> Result<Self> {
        let config = Config::load_or_default(config_path).context("Failed to load configuration")?;
        let backend = Arc::new(FileBackend::new(config.graphs_path()));
        let store = GraphStore::new(PartRegistry::builtin(), backend)
            .with_config(config.project.store.clone());
        Ok(Self { config, store })
    }

    /// Load one graph, returning its store key
    pub async fn load(&self, graph: &str) -> Result<String> {
        let key = graph_key(graph);
        self.store
            .load(&key)
            .await
            .with_context(|| format!("Failed to load graph '{}'", graph))?;
        Ok(key)
    }

    /// Keys of every graph file below the graphs directory
    pub fn discover(&self) -> Vec<String> {
        discover_graphs(&self.config.graphs_path())
    }

    /// Load a graph, apply one request and save it
    pub async fn edit(&self, graph: &str, request: Request) -> Result<()> {
        let key = self.load(graph).await?;
        let op = request.op();
        self.store
            .apply(&key, request)
            .await
            .with_context(|| format!("{} failed on graph '{}'", op, graph))?;
        self.store
            .save(&key)
            .await
            .with_context(|| format!("Failed to save graph '{}'", graph))?;
        tracing::info!("✓ {} applied to {}", op, key);
        Ok(())
    }
}

/// Store key for a graph argument: a file name relative to the graphs
/// directory, `.json` appended when missing
pub fn graph_key(graph: &str) -> String {
    if Path::new(graph)
        .extension()
        .is_some_and(|ext| ext == GRAPH_EXTENSION)
    {
        graph.to_string()
    } else {
        format!("{}.{}", graph, GRAPH_EXTENSION)
    }
}

/// Graph name for a store key: the file stem
pub fn graph_stem(key: &str) -> String {
    Path::new(key)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| key.to_string())
}

/// Keys of all `.json` files below `dir`, sorted
pub fn discover_graphs(dir: &Path) -> Vec<String> {
    let mut keys: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == GRAPH_EXTENSION)
        })
        .filter_map(|e| {
            e.path()
                .strip_prefix(dir)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    keys.sort();
    keys
}

/// Split `NODE.PIN` at the last dot
pub fn parse_pin_ref(s: &str) -> Result<(String, String)> {
    match s.rsplit_once('.') {
        Some((node, pin)) if !node.is_empty() && !pin.is_empty() => {
            Ok((node.to_string(), pin.to_string()))
        }
        _ => anyhow::bail!("Expected NODE.PIN, got '{}'", s),
    }
}

/// Parse a part configuration argument
pub fn parse_part(part: Option<&str>) -> Result<serde_json::Value> {
    match part {
        Some(s) => serde_json::from_str(s).context("Part configuration is not valid JSON"),
        None => Ok(serde_json::Value::Null),
    }
}

/// Directory receiving the generated package of a graph
pub fn package_dir(config: &Config, key: &str, out: Option<&str>) -> PathBuf {
    match out {
        Some(dir) => PathBuf::from(dir),
        None => config.output_path().join(graph_stem(key)),
    }
}
