//! Chanweave Core Library
//!
//! This crate holds the model behind chanweave's visual concurrent programs:
//! - Parts: the node behaviours (Code, Broadcast, Join, Filter, Sink, HTTPServer)
//! - Graph: nodes, channels and the pin bindings between them
//! - Store: a concurrency-safe façade applying validated mutations
//! - Persistence: the JSON graph format and storage backends
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Requests   │────▶│ GraphStore  │────▶│ Persistence │
//! │   (JSON)    │     │ (per-graph  │     │ (JSON file) │
//! └─────────────┘     │    lock)    │     └─────────────┘
//!                     └──────┬──────┘
//!                            ▼
//!                     ┌─────────────┐
//!                     │    Graph    │◀──── PartRegistry
//!                     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use chanweave_core::{GraphStore, PartRegistry, backend::FileBackend};
//!
//! let store = GraphStore::new(PartRegistry::builtin(), Arc::new(FileBackend::new("graphs")));
//! store.load("pipeline.json").await?;
//! store.create_node("pipeline.json", CreateNode::new("Drain", "Sink", json!({"type": "int"}))).await?;
//! store.save("pipeline.json").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod graph;
pub mod parts;
pub mod persist;
pub mod pin;
pub mod registry;
pub mod store;

pub use api::Request;
pub use config::{Config, ProjectConfig};
pub use error::{Error, ErrorCode, Result};
pub use graph::{Channel, Graph, Node, PinRef};
pub use parts::Part;
pub use pin::{Direction, PinDefinition};
pub use registry::PartRegistry;
pub use store::{GraphGenerator, GraphStore};
