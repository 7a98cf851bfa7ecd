//! Schema-driven entity derivation and the transactional orchestrations
//! built on it.
//!
//! `derive_entity` and `diff_entity` are pure: they turn field data into a
//! node, metadata, and edge changes without touching the store. The
//! `create_entity`, `update_entity`, and `delete_entity` orchestrations
//! apply those results under a transaction, registering compensations so a
//! failure partway through a multi-write sequence rolls the store back to
//! where it started.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::nodes::DeleteNodesResult;
use crate::graph::store::GraphStore;
use crate::graph::tx::TransactionCoordinator;
use crate::graph::types::{Edge, EdgeKey, Graph, Node, NodeUpdate};
use crate::graph::{edges, nodes};
use crate::schema::types::SchemaDefinition;

/// Edge mutations produced by an entity diff. Removals are applied before
/// additions so a replaced relationship never collides with itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeChanges {
    pub remove: Vec<Edge>,
    pub add: Vec<Edge>,
}

/// Result of diffing an update against the current entity state.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDiff {
    /// Replacement metadata array for the node.
    pub metadata: Vec<String>,
    /// Relationship edges to remove and add.
    pub edges: EdgeChanges,
}

/// Derive the node and relationship edges for a new entity.
///
/// `data` must carry a non-empty `name` plus every field in the
/// definition's required set. Relationship fields emit one edge per value;
/// every other field, declared or not, renders as a `"Key: value"` metadata
/// entry with list values joined by `", "`. Null values are skipped.
/// Metadata order follows `data`'s key order (sorted, since `serde_json`
/// maps are ordered by key).
pub fn derive_entity(
    definition: &SchemaDefinition,
    entity_type: &str,
    data: &Map<String, Value>,
) -> Result<(Node, Vec<Edge>)> {
    let name = match data.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(Error::Validation(
                "entity data must include a non-empty name".into(),
            ))
        }
    };

    for field in &definition.required_fields {
        if !data.contains_key(field) {
            return Err(Error::Validation(format!(
                "missing required field: {field}"
            )));
        }
    }

    let mut node = Node::new(name.clone(), entity_type);
    let mut relationship_edges = Vec::new();

    for (field, value) in data {
        if field == "name" || value.is_null() {
            continue;
        }
        match definition.relationship_edge_type(field) {
            Some(edge_type) => {
                for target in value_to_targets(value) {
                    relationship_edges.push(Edge::new(name.clone(), target, edge_type));
                }
            }
            None => node.metadata.push(format_metadata(field, value)),
        }
    }

    Ok((node, relationship_edges))
}

/// Compute the update diff for an existing entity.
///
/// `name` is identity and cannot be updated. A relationship field replaces
/// wholesale: every existing edge of that type from the node is removed and
/// the new value decides what comes back (null clears it). A metadata field
/// replaces the entry whose key matches case-insensitively, or appends when
/// no entry matches; other entries keep their position.
pub fn diff_entity(
    definition: &SchemaDefinition,
    current: &Node,
    updates: &Map<String, Value>,
    graph: &Graph,
) -> Result<EntityDiff> {
    if updates.contains_key("name") {
        return Err(Error::Validation("entity name cannot be changed".into()));
    }

    let mut metadata = current.metadata.clone();
    let mut changes = EdgeChanges::default();

    for (field, value) in updates {
        match definition.relationship_edge_type(field) {
            Some(edge_type) => {
                for edge in &graph.edges {
                    if edge.from == current.name && edge.edge_type == edge_type {
                        changes.remove.push(edge.clone());
                    }
                }
                if !value.is_null() {
                    for target in value_to_targets(value) {
                        changes
                            .add
                            .push(Edge::new(current.name.clone(), target, edge_type));
                    }
                }
            }
            None => {
                if !value.is_null() {
                    replace_metadata(&mut metadata, field, value);
                }
            }
        }
    }

    Ok(EntityDiff {
        metadata,
        edges: changes,
    })
}

/// Format one metadata entry, capitalizing the field's first letter:
/// `race` becomes `"Race: Orc"`.
fn format_metadata(field: &str, value: &Value) -> String {
    format!("{}: {}", capitalize(field), value_to_text(value))
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Render a JSON value as metadata text; lists join with `", "`.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Expand a relationship value into its target node names.
fn value_to_targets(value: &Value) -> Vec<String> {
    match value {
        Value::String(target) => vec![target.clone()],
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        other => vec![other.to_string()],
    }
}

/// Replace the entry whose key matches `field` case-insensitively, keeping
/// its position, or append a new entry when no key matches. Entries that
/// do not parse as `"Key: value"` are left alone.
fn replace_metadata(metadata: &mut Vec<String>, field: &str, value: &Value) {
    let needle = field.to_lowercase();
    for entry in metadata.iter_mut() {
        if let Some((key, _)) = entry.split_once(':') {
            if key.trim().to_lowercase() == needle {
                *entry = format_metadata(field, value);
                return;
            }
        }
    }
    metadata.push(format_metadata(field, value));
}

/// Create a schema-backed entity: derive the node and relationship edges,
/// then apply both under a transaction so a failed edge write cannot leave
/// the bare node behind.
pub fn create_entity(
    store: &mut GraphStore,
    tx: &mut TransactionCoordinator,
    definition: &SchemaDefinition,
    entity_type: &str,
    data: &Map<String, Value>,
) -> Result<(Node, Vec<Edge>)> {
    let (node, relationship_edges) = derive_entity(definition, entity_type, data)?;

    tx.begin(store)?;
    match apply_create(store, tx, &node, &relationship_edges) {
        Ok(()) => {
            tx.commit()?;
            debug!(name = %node.name, entity_type, edges = relationship_edges.len(), "entity created");
            Ok((node, relationship_edges))
        }
        Err(err) => {
            rollback_best_effort(store, tx);
            Err(err)
        }
    }
}

fn apply_create(
    store: &mut GraphStore,
    tx: &mut TransactionCoordinator,
    node: &Node,
    relationship_edges: &[Edge],
) -> Result<()> {
    nodes::add_nodes(store, vec![node.clone()])?;
    let name = node.name.clone();
    tx.add_rollback_action(
        Box::new(move |store| nodes::delete_nodes(store, &[name]).map(|_| ())),
        format!("remove created node {}", node.name),
    )?;

    if !relationship_edges.is_empty() {
        // Removing the node cascades to these, so one compensation covers both.
        edges::add_edges(store, relationship_edges.to_vec())?;
    }
    Ok(())
}

/// Update a schema-backed entity under a transaction: diff against the
/// snapshot, register a compensation that restores the original node and
/// exactly reverses the edge changes, then apply the metadata replacement,
/// edge removals, and edge additions in that order.
pub fn update_entity(
    store: &mut GraphStore,
    tx: &mut TransactionCoordinator,
    definition: &SchemaDefinition,
    entity_type: &str,
    name: &str,
    updates: &Map<String, Value>,
) -> Result<Node> {
    tx.begin(store)?;
    match apply_update(store, tx, definition, entity_type, name, updates) {
        Ok(node) => {
            tx.commit()?;
            debug!(name, entity_type, "entity updated");
            Ok(node)
        }
        Err(err) => {
            rollback_best_effort(store, tx);
            Err(err)
        }
    }
}

fn apply_update(
    store: &mut GraphStore,
    tx: &mut TransactionCoordinator,
    definition: &SchemaDefinition,
    entity_type: &str,
    name: &str,
    updates: &Map<String, Value>,
) -> Result<Node> {
    let graph = match tx.current_graph() {
        Some(graph) => graph.clone(),
        None => return Err(Error::TransactionState("no active transaction".into())),
    };
    let current = find_entity(&graph, entity_type, name)?.clone();

    let diff = diff_entity(definition, &current, updates, &graph)?;

    // Register the full inverse before the first write lands.
    let original = current.clone();
    let removed = diff.edges.remove.clone();
    let added: Vec<EdgeKey> = diff.edges.add.iter().map(EdgeKey::from).collect();
    tx.add_rollback_action(
        Box::new(move |store| restore_entity(store, &original, &removed, &added)),
        format!("restore node {name} and its relationship edges"),
    )?;

    let updated = nodes::update_nodes(
        store,
        vec![NodeUpdate {
            name: name.to_string(),
            node_type: None,
            metadata: Some(diff.metadata),
        }],
    )?;

    if !diff.edges.remove.is_empty() {
        edges::delete_edges(store, diff.edges.remove.iter().map(EdgeKey::from).collect())?;
    }
    if !diff.edges.add.is_empty() {
        edges::add_edges(store, diff.edges.add.clone())?;
    }

    updated
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("node not found: {name}")))
}

/// Compensation for `update_entity`: put the original node back and reverse
/// whichever edge changes actually landed. The failure may have struck
/// before the edge phase, so both directions tolerate edges that are not in
/// the state the forward path would have left them in.
fn restore_entity(
    store: &mut GraphStore,
    original: &Node,
    removed: &[Edge],
    added: &[EdgeKey],
) -> Result<()> {
    nodes::update_nodes(
        store,
        vec![NodeUpdate {
            name: original.name.clone(),
            node_type: Some(original.node_type.clone()),
            metadata: Some(original.metadata.clone()),
        }],
    )?;

    let graph = store.load()?;
    let to_delete: Vec<EdgeKey> = added
        .iter()
        .filter(|key| graph.edge(key).is_some())
        .cloned()
        .collect();
    if !to_delete.is_empty() {
        edges::delete_edges(store, to_delete)?;
    }

    let graph = store.load()?;
    let to_readd: Vec<Edge> = removed
        .iter()
        .filter(|edge| graph.edge(&EdgeKey::from(*edge)).is_none())
        .cloned()
        .collect();
    if !to_readd.is_empty() {
        edges::add_edges(store, to_readd)?;
    }
    Ok(())
}

/// Delete a schema-backed entity and every edge touching it under a
/// transaction; the compensation re-creates the node and its edges.
pub fn delete_entity(
    store: &mut GraphStore,
    tx: &mut TransactionCoordinator,
    entity_type: &str,
    name: &str,
) -> Result<DeleteNodesResult> {
    tx.begin(store)?;
    match apply_delete(store, tx, entity_type, name) {
        Ok(result) => {
            tx.commit()?;
            debug!(name, entity_type, edges = result.edges_removed, "entity deleted");
            Ok(result)
        }
        Err(err) => {
            rollback_best_effort(store, tx);
            Err(err)
        }
    }
}

fn apply_delete(
    store: &mut GraphStore,
    tx: &mut TransactionCoordinator,
    entity_type: &str,
    name: &str,
) -> Result<DeleteNodesResult> {
    let graph = match tx.current_graph() {
        Some(graph) => graph.clone(),
        None => return Err(Error::TransactionState("no active transaction".into())),
    };
    let node = find_entity(&graph, entity_type, name)?.clone();
    let touching: Vec<Edge> = graph
        .edges
        .iter()
        .filter(|edge| edge.touches(name))
        .cloned()
        .collect();

    let restore_node = node.clone();
    let restore_edges = touching.clone();
    tx.add_rollback_action(
        Box::new(move |store| {
            nodes::add_nodes(store, vec![restore_node])?;
            if !restore_edges.is_empty() {
                edges::add_edges(store, restore_edges)?;
            }
            Ok(())
        }),
        format!("restore deleted node {name} and its edges"),
    )?;

    nodes::delete_nodes(store, &[name.to_string()])
}

/// Look up `name` and check it is an entity of the expected type.
fn find_entity<'a>(graph: &'a Graph, entity_type: &str, name: &str) -> Result<&'a Node> {
    match graph.node(name) {
        Some(node) if node.node_type == entity_type => Ok(node),
        Some(node) => Err(Error::NotFound(format!(
            "node {name} has type {}, not {entity_type}",
            node.node_type
        ))),
        None => Err(Error::NotFound(format!("node not found: {name}"))),
    }
}

fn rollback_best_effort(store: &mut GraphStore, tx: &mut TransactionCoordinator) {
    if let Err(err) = tx.rollback(store) {
        warn!(error = %err, "rollback failed");
    }
}
