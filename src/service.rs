//! The operation facade consumed by protocol layers and embedders.
//!
//! One [`Engram`] value owns the file-backed store, the schema registry,
//! and the transaction coordinator. Every mutating method takes `&mut
//! self`, which makes exclusive access the serialization point for the
//! store's load-mutate-save cycle; callers that share an `Engram` across
//! threads wrap it in a `Mutex`.

use serde_json::{Map, Value};

use crate::config::EngramConfig;
use crate::error::{Error, Result};
use crate::graph::nodes::DeleteNodesResult;
use crate::graph::store::GraphStore;
use crate::graph::tx::{RollbackAction, TransactionCoordinator};
use crate::graph::types::{Edge, EdgeFilter, EdgeKey, EdgeUpdate, Graph, Node, NodeUpdate};
use crate::graph::{edges, metadata, nodes, search};
use crate::schema::engine;
use crate::schema::registry::SchemaRegistry;
use crate::schema::types::{EntitySchema, SchemaDefinition};

/// Handle to one knowledge graph: store, schemas, and transactions wired
/// together.
pub struct Engram {
    store: GraphStore,
    schemas: SchemaRegistry,
    tx: TransactionCoordinator,
}

impl Engram {
    /// Open the store and schema registry described by `config`.
    pub fn open(config: &EngramConfig) -> Result<Self> {
        let store = GraphStore::open(config.resolved_graph_path(), config.storage.lenient_load)?;
        let schemas = SchemaRegistry::load_dir(config.resolved_schema_dir())?;
        Ok(Self::new(store, schemas))
    }

    /// Assemble from explicit parts. Useful for embedders and tests that
    /// manage their own paths.
    pub fn new(store: GraphStore, schemas: SchemaRegistry) -> Self {
        Self {
            store,
            schemas,
            tx: TransactionCoordinator::new(),
        }
    }

    // Nodes

    pub fn add_nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        nodes::add_nodes(&mut self.store, nodes)
    }

    pub fn update_nodes(&mut self, updates: Vec<NodeUpdate>) -> Result<Vec<Node>> {
        nodes::update_nodes(&mut self.store, updates)
    }

    pub fn delete_nodes(&mut self, names: &[String]) -> Result<DeleteNodesResult> {
        nodes::delete_nodes(&mut self.store, names)
    }

    pub fn get_nodes(&mut self, names: Option<&[String]>) -> Result<Vec<Node>> {
        nodes::get_nodes(&mut self.store, names)
    }

    // Edges

    pub fn add_edges(&mut self, edges: Vec<Edge>) -> Result<Vec<Edge>> {
        edges::add_edges(&mut self.store, edges)
    }

    pub fn update_edges(&mut self, updates: Vec<EdgeUpdate>) -> Result<Vec<Edge>> {
        edges::update_edges(&mut self.store, updates)
    }

    pub fn delete_edges(&mut self, keys: Vec<EdgeKey>) -> Result<usize> {
        edges::delete_edges(&mut self.store, keys)
    }

    pub fn get_edges(&mut self, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        edges::get_edges(&mut self.store, filter)
    }

    // Metadata

    pub fn add_metadata(&mut self, name: &str, entries: Vec<String>) -> Result<Vec<String>> {
        metadata::add_metadata(&mut self.store, name, entries)
    }

    pub fn delete_metadata(&mut self, name: &str, entries: &[String]) -> Result<usize> {
        metadata::delete_metadata(&mut self.store, name, entries)
    }

    pub fn get_metadata(&mut self, name: &str) -> Result<Vec<String>> {
        metadata::get_metadata(&mut self.store, name)
    }

    // Search and reads

    pub fn search_nodes(&mut self, query: &str) -> Result<Graph> {
        search::search_nodes(&mut self.store, query)
    }

    pub fn open_nodes(&mut self, names: &[String]) -> Result<Graph> {
        search::open_nodes(&mut self.store, names)
    }

    pub fn read_graph(&mut self) -> Result<Graph> {
        search::read_graph(&mut self.store)
    }

    // Transactions

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.tx.begin(&mut self.store)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.tx.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.tx.rollback(&mut self.store)
    }

    pub fn add_rollback_action(
        &mut self,
        action: RollbackAction,
        description: impl Into<String>,
    ) -> Result<()> {
        self.tx.add_rollback_action(action, description)
    }

    pub fn is_in_transaction(&self) -> bool {
        self.tx.is_active()
    }

    /// The snapshot taken when the active transaction began, if any.
    pub fn current_graph(&self) -> Option<&Graph> {
        self.tx.current_graph()
    }

    // Schema-backed entities

    /// Create an entity of `entity_type` from field data, per its schema.
    /// Returns the node and the relationship edges that were written.
    pub fn create_entity(
        &mut self,
        entity_type: &str,
        data: &Map<String, Value>,
    ) -> Result<(Node, Vec<Edge>)> {
        let definition = self.definition(entity_type)?;
        engine::create_entity(&mut self.store, &mut self.tx, &definition, entity_type, data)
    }

    /// Update an entity's fields per its schema. Returns the updated node.
    pub fn update_entity(
        &mut self,
        entity_type: &str,
        name: &str,
        updates: &Map<String, Value>,
    ) -> Result<Node> {
        let definition = self.definition(entity_type)?;
        engine::update_entity(
            &mut self.store,
            &mut self.tx,
            &definition,
            entity_type,
            name,
            updates,
        )
    }

    /// Delete an entity and every edge touching it.
    pub fn delete_entity(&mut self, entity_type: &str, name: &str) -> Result<DeleteNodesResult> {
        // The type check happens inside; the schema lookup gates unknown types.
        self.definition(entity_type)?;
        engine::delete_entity(&mut self.store, &mut self.tx, entity_type, name)
    }

    fn definition(&self, entity_type: &str) -> Result<SchemaDefinition> {
        match self.schemas.get(entity_type) {
            Some(schema) => Ok(schema.definition()),
            None => Err(Error::Schema(format!("unknown entity type: {entity_type}"))),
        }
    }

    /// The loaded schema registry.
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// The schema document for `entity_type`, if loaded.
    pub fn schema(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }
}
