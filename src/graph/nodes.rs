//! Node create, update, delete, and fetch operations.
//!
//! Every mutation follows the same cycle: load the full graph, validate the
//! whole batch, mutate the in-memory copy, persist. A validation failure
//! aborts before anything is written, so a batch either lands completely or
//! not at all.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;
use crate::graph::types::{Node, NodeUpdate};

/// Counts reported by [`delete_nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNodesResult {
    /// Nodes actually removed; missing names are skipped, not errors.
    pub nodes_removed: usize,
    /// Edges removed by the cascade.
    pub edges_removed: usize,
}

/// Add a batch of nodes.
///
/// Rejects an empty `name` or `node_type`, a `name` already present in the
/// store, and a `name` repeated within the batch. Returns the added nodes.
pub fn add_nodes(store: &mut GraphStore, nodes: Vec<Node>) -> Result<Vec<Node>> {
    let mut graph = store.load()?;

    let mut batch_names: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in &nodes {
        if node.name.is_empty() {
            return Err(Error::Validation("node name must not be empty".into()));
        }
        if node.node_type.is_empty() {
            return Err(Error::Validation(format!(
                "node {:?} is missing a node type",
                node.name
            )));
        }
        if graph.has_node(&node.name) {
            return Err(Error::Validation(format!(
                "node already exists: {}",
                node.name
            )));
        }
        if !batch_names.insert(node.name.as_str()) {
            return Err(Error::Validation(format!(
                "duplicate node in batch: {}",
                node.name
            )));
        }
    }

    graph.nodes.extend(nodes.iter().cloned());
    store.save(&graph)?;
    debug!(count = nodes.len(), "nodes added");
    Ok(nodes)
}

/// Apply partial updates to existing nodes.
///
/// Each target must exist. `node_type` replaces when supplied; `metadata`
/// replaces the whole array when supplied. Returns the updated nodes.
pub fn update_nodes(store: &mut GraphStore, updates: Vec<NodeUpdate>) -> Result<Vec<Node>> {
    let mut graph = store.load()?;

    let mut updated = Vec::with_capacity(updates.len());
    for update in updates {
        let node = match graph.node_mut(&update.name) {
            Some(node) => node,
            None => return Err(Error::NotFound(format!("node not found: {}", update.name))),
        };
        if let Some(node_type) = update.node_type {
            node.node_type = node_type;
        }
        if let Some(metadata) = update.metadata {
            node.metadata = metadata;
        }
        updated.push(node.clone());
    }

    store.save(&graph)?;
    debug!(count = updated.len(), "nodes updated");
    Ok(updated)
}

/// Delete the named nodes and cascade to every edge touching them.
///
/// Names with no matching node are skipped; the counts reflect what was
/// actually removed.
pub fn delete_nodes(store: &mut GraphStore, names: &[String]) -> Result<DeleteNodesResult> {
    let mut graph = store.load()?;

    let targets: HashSet<&str> = names.iter().map(String::as_str).collect();
    let nodes_before = graph.nodes.len();
    let edges_before = graph.edges.len();

    graph
        .nodes
        .retain(|node| !targets.contains(node.name.as_str()));
    graph
        .edges
        .retain(|edge| !targets.contains(edge.from.as_str()) && !targets.contains(edge.to.as_str()));

    let result = DeleteNodesResult {
        nodes_removed: nodes_before - graph.nodes.len(),
        edges_removed: edges_before - graph.edges.len(),
    };

    store.save(&graph)?;
    debug!(
        nodes = result.nodes_removed,
        edges = result.edges_removed,
        "nodes deleted"
    );
    Ok(result)
}

/// Fetch nodes by name, or every node when `names` is `None`.
///
/// With names supplied, each must exist.
pub fn get_nodes(store: &mut GraphStore, names: Option<&[String]>) -> Result<Vec<Node>> {
    let graph = store.load()?;
    match names {
        None => Ok(graph.nodes),
        Some(names) => {
            let mut out = Vec::with_capacity(names.len());
            for name in names {
                match graph.node(name) {
                    Some(node) => out.push(node.clone()),
                    None => return Err(Error::NotFound(format!("node not found: {name}"))),
                }
            }
            Ok(out)
        }
    }
}
