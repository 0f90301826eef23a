//! Concurrency-safe graph store
//!
//! The store owns every loaded graph. Each graph sits behind its own
//! exclusive lock, held for the whole of a mutation, a read (such as a code
//! generation pass) or a save. The table mapping keys to graphs has a separate
//! lock that is only held long enough to look up or insert an entry, so
//! independent graphs never wait on each other.
//!
//! Mutations are validated before anything changes; a failed call leaves the
//! graph untouched. There is no versioning: concurrent callers are serialized
//! and the last write wins.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::api::{
    ConnectPin, CreateChannel, CreateNode, DeleteChannel, DeleteNode, DisconnectPin, Request,
    SetGraphProperties, SetNodeProperties, SetPosition,
};
use crate::backend::Persistence;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::registry::PartRegistry;

/// Lowers a graph into some output while the store holds the graph's lock
pub trait GraphGenerator {
    /// What one generation pass produces
    type Output;

    /// Generate from a consistent graph
    fn generate(&self, graph: &Graph) -> Self::Output;
}

/// Mutation façade over the loaded graphs
pub struct GraphStore {
    registry: Arc<PartRegistry>,
    backend: Arc<dyn Persistence>,
    config: StoreConfig,
    graphs: RwLock<HashMap<String, Arc<Mutex<Graph>>>>,
}

impl GraphStore {
    /// Create a store with the given part registry and persistence backend
    pub fn new(registry: PartRegistry, backend: Arc<dyn Persistence>) -> Self {
        Self {
            registry: Arc::new(registry),
            backend,
            config: StoreConfig::default(),
            graphs: RwLock::new(HashMap::new()),
        }
    }

    /// Override store settings
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// The part registry this store constructs parts with
    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    async fn handle(&self, key: &str) -> Result<Arc<Mutex<Graph>>> {
        self.graphs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::GraphNotFound(key.to_string()))
    }

    async fn insert(&self, key: &str, graph: Graph) -> Result<()> {
        let mut graphs = self.graphs.write().await;
        if graphs.contains_key(key) {
            return Err(Error::GraphExists(key.to_string()));
        }
        graphs.insert(key.to_string(), Arc::new(Mutex::new(graph)));
        Ok(())
    }

    /// Register a graph under `key` without touching the backend
    pub async fn create_graph(&self, key: &str, graph: Graph) -> Result<()> {
        graph.ensure_consistent()?;
        self.insert(key, graph).await?;
        tracing::info!("Created graph {}", key);
        Ok(())
    }

    /// Read, verify and register the graph stored under `key`
    pub async fn load(&self, key: &str) -> Result<()> {
        if self.graphs.read().await.contains_key(key) {
            return Err(Error::GraphExists(key.to_string()));
        }
        let bytes = self.backend.read(key).await?;
        let graph = Graph::from_json(&bytes, &self.registry)?;
        tracing::info!(
            "Loaded graph {} ({} nodes, {} channels)",
            key,
            graph.node_count(),
            graph.channel_count()
        );
        self.insert(key, graph).await
    }

    /// Load several graphs concurrently; stops at the first failure
    pub async fn load_all(&self, keys: &[String]) -> Result<()> {
        futures::future::try_join_all(keys.iter().map(|k| self.load(k))).await?;
        Ok(())
    }

    /// Forget a loaded graph, returning its last state
    pub async fn unload(&self, key: &str) -> Result<Graph> {
        let handle = self
            .graphs
            .write()
            .await
            .remove(key)
            .ok_or_else(|| Error::GraphNotFound(key.to_string()))?;
        let graph = handle.lock().await.clone();
        Ok(graph)
    }

    /// Keys of every loaded graph, sorted
    pub async fn graph_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.graphs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Run `f` against the graph while holding its lock
    pub async fn read<T>(&self, key: &str, f: impl FnOnce(&Graph) -> T) -> Result<T> {
        let handle = self.handle(key).await?;
        let graph = handle.lock().await;
        Ok(f(&*graph))
    }

    /// Run a generation pass over the graph under its lock
    pub async fn generate<G: GraphGenerator>(&self, key: &str, generator: &G) -> Result<G::Output> {
        tracing::debug!(graph = %key, "generating");
        self.read(key, |g| generator.generate(g)).await
    }

    /// Clone the current state of a graph
    pub async fn snapshot(&self, key: &str) -> Result<Graph> {
        self.read(key, Graph::clone).await
    }

    async fn mutate<T>(
        &self,
        key: &str,
        op: &'static str,
        f: impl FnOnce(&mut Graph, &PartRegistry) -> Result<T>,
    ) -> Result<T> {
        let handle = self.handle(key).await?;
        let mut graph = handle.lock().await;
        let result = f(&mut *graph, &self.registry);
        match &result {
            Ok(_) => tracing::debug!(graph = %key, op, "applied"),
            Err(e) => tracing::debug!(graph = %key, op, error = %e, "rejected"),
        }
        debug_assert!(
            graph.check_consistency().is_empty(),
            "{} left graph {} inconsistent: {:?}",
            op,
            key,
            graph.check_consistency()
        );
        result
    }

    /// See [`Graph::create_node`]
    pub async fn create_node(&self, key: &str, req: CreateNode) -> Result<()> {
        self.mutate(key, "CreateNode", |g, r| g.create_node(r, req))
            .await
    }

    /// See [`Graph::create_channel`]
    pub async fn create_channel(&self, key: &str, req: CreateChannel) -> Result<()> {
        self.mutate(key, "CreateChannel", |g, _| g.create_channel(req))
            .await
    }

    /// See [`Graph::connect_pin`]
    pub async fn connect_pin(&self, key: &str, req: ConnectPin) -> Result<()> {
        self.mutate(key, "ConnectPin", |g, _| g.connect_pin(req))
            .await
    }

    /// See [`Graph::disconnect_pin`]
    pub async fn disconnect_pin(&self, key: &str, req: DisconnectPin) -> Result<()> {
        self.mutate(key, "DisconnectPin", |g, _| g.disconnect_pin(req))
            .await
    }

    /// See [`Graph::delete_channel`]
    pub async fn delete_channel(&self, key: &str, req: DeleteChannel) -> Result<()> {
        self.mutate(key, "DeleteChannel", |g, _| g.delete_channel(req))
            .await
    }

    /// See [`Graph::delete_node`]
    pub async fn delete_node(&self, key: &str, req: DeleteNode) -> Result<()> {
        self.mutate(key, "DeleteNode", |g, _| g.delete_node(req))
            .await
    }

    /// See [`Graph::set_node_properties`]
    pub async fn set_node_properties(&self, key: &str, req: SetNodeProperties) -> Result<()> {
        self.mutate(key, "SetNodeProperties", |g, r| {
            g.set_node_properties(r, req)
        })
        .await
    }

    /// See [`Graph::set_position`]
    pub async fn set_position(&self, key: &str, req: SetPosition) -> Result<()> {
        self.mutate(key, "SetPosition", |g, _| g.set_position(req))
            .await
    }

    /// See [`Graph::set_properties`]
    pub async fn set_graph_properties(&self, key: &str, req: SetGraphProperties) -> Result<()> {
        self.mutate(key, "SetGraphProperties", |g, _| {
            g.set_properties(req);
            Ok(())
        })
        .await
    }

    /// Write the graph through the backend.
    ///
    /// Failures are reported; the in-memory graph is kept as is.
    pub async fn save(&self, key: &str) -> Result<()> {
        let handle = self.handle(key).await?;
        let graph = handle.lock().await;
        let bytes = graph.to_json()?;
        let timeout = self.config.save_timeout();

        match tokio::time::timeout(timeout, self.backend.write(key, &bytes)).await {
            Ok(Ok(())) => {
                tracing::info!("Saved graph {} ({} bytes)", key, bytes.len());
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!("Saving graph {} failed: {}", key, e);
                Err(e)
            }
            Err(_) => {
                tracing::warn!("Saving graph {} timed out", key);
                Err(Error::SaveTimeout {
                    key: key.to_string(),
                    millis: self.config.save_timeout_ms,
                })
            }
        }
    }

    /// Dispatch one request from the request surface
    pub async fn apply(&self, key: &str, req: Request) -> Result<()> {
        match req {
            Request::CreateNode(r) => self.create_node(key, r).await,
            Request::CreateChannel(r) => self.create_channel(key, r).await,
            Request::ConnectPin(r) => self.connect_pin(key, r).await,
            Request::DisconnectPin(r) => self.disconnect_pin(key, r).await,
            Request::DeleteNode(r) => self.delete_node(key, r).await,
            Request::DeleteChannel(r) => self.delete_channel(key, r).await,
            Request::SetNodeProperties(r) => self.set_node_properties(key, r).await,
            Request::SetGraphProperties(r) => self.set_graph_properties(key, r).await,
            Request::SetPosition(r) => self.set_position(key, r).await,
            Request::Save => self.save(key).await,
        }
    }
}
