//! Knowledge-graph memory for AI agents: typed nodes, weighted edges, and
//! schema-driven entities in a single line-delimited JSON file.
//!
//! Engram stores named entities ("nodes") and directed, typed, weighted
//! relationships ("edges") and exposes the operations an agent-facing
//! protocol layer needs: batch CRUD over nodes, edges, and metadata;
//! substring search with neighbor expansion; compensating transactions for
//! multi-step mutations; and a schema engine that turns declarative entity
//! definitions into node and edge writes.
//!
//! # Architecture
//!
//! - **Storage**: one self-describing JSON record per line, tagged
//!   `"node"` or `"edge"`, rewritten atomically on every mutation; lookup
//!   indices over edges (by source, target, and type) are derived on load
//! - **Transactions**: write-through with compensation; multi-step
//!   operations register inverse actions and roll back in reverse order
//! - **Schemas**: one `*.schema.json` document per entity type declares
//!   which fields become metadata and which become relationship edges
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`graph`] — Store, node/edge/metadata operations, search, and transactions
//! - [`schema`] — Schema documents, discovery, and the entity engine
//! - [`service`] — The [`Engram`] facade wiring the pieces together
//!
//! A single [`Engram`] value owns the store; mutation requires `&mut self`,
//! so share it behind a `Mutex` when multiple callers are involved.

pub mod config;
pub mod error;
pub mod graph;
pub mod schema;
pub mod service;

pub use config::EngramConfig;
pub use error::{Error, Result};
pub use graph::nodes::DeleteNodesResult;
pub use graph::types::{Edge, EdgeFilter, EdgeKey, EdgeUpdate, Graph, Node, NodeUpdate};
pub use service::Engram;
