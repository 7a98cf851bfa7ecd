//! Edge create, update, delete, and index-backed lookup.
//!
//! Edges are identified by their `(from, to, edge_type)` triple. Both
//! endpoints must exist as nodes, the triple must be unique, and weights
//! must sit in `[0.0, 1.0]`. Mutations share the batch contract of the node
//! operations: validate everything, then write, or write nothing.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;
use crate::graph::types::{edge_id, Edge, EdgeFilter, EdgeKey, EdgeUpdate};

fn validate_weight(weight: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(Error::Validation(format!(
            "edge weight must be between 0.0 and 1.0, got {weight}"
        )));
    }
    Ok(())
}

/// Add a batch of edges.
///
/// Each edge must reference two existing nodes and carry a triple unique
/// against the store and within the batch. Returns the added edges.
pub fn add_edges(store: &mut GraphStore, edges: Vec<Edge>) -> Result<Vec<Edge>> {
    let mut graph = store.load()?;

    let mut seen: HashSet<String> = graph.edges.iter().map(Edge::id).collect();
    for edge in &edges {
        validate_weight(edge.weight)?;
        if !graph.has_node(&edge.from) {
            return Err(Error::Validation(format!(
                "source node not found: {}",
                edge.from
            )));
        }
        if !graph.has_node(&edge.to) {
            return Err(Error::Validation(format!(
                "target node not found: {}",
                edge.to
            )));
        }
        if !seen.insert(edge.id()) {
            return Err(Error::Validation(format!(
                "edge already exists: {}",
                edge.id()
            )));
        }
    }

    graph.edges.extend(edges.iter().cloned());
    store.save(&graph)?;
    debug!(count = edges.len(), "edges added");
    Ok(edges)
}

/// Update edges addressed by their current triple.
///
/// `new_*` fields rename the key or adjust the weight; a renamed endpoint
/// must exist and the resulting triple must not collide with another edge.
/// Returns the updated edges.
pub fn update_edges(store: &mut GraphStore, updates: Vec<EdgeUpdate>) -> Result<Vec<Edge>> {
    let mut graph = store.load()?;

    let mut updated = Vec::with_capacity(updates.len());
    for update in updates {
        let current_id = edge_id(&update.from, &update.to, &update.edge_type);
        let position = match graph.edges.iter().position(|edge| edge.id() == current_id) {
            Some(position) => position,
            None => return Err(Error::NotFound(format!("edge not found: {current_id}"))),
        };

        if let Some(new_from) = &update.new_from {
            if !graph.has_node(new_from) {
                return Err(Error::Validation(format!(
                    "source node not found: {new_from}"
                )));
            }
        }
        if let Some(new_to) = &update.new_to {
            if !graph.has_node(new_to) {
                return Err(Error::Validation(format!("target node not found: {new_to}")));
            }
        }
        if let Some(weight) = update.new_weight {
            validate_weight(weight)?;
        }

        let mut edge = graph.edges[position].clone();
        if let Some(new_from) = update.new_from {
            edge.from = new_from;
        }
        if let Some(new_to) = update.new_to {
            edge.to = new_to;
        }
        if let Some(new_edge_type) = update.new_edge_type {
            edge.edge_type = new_edge_type;
        }
        if let Some(weight) = update.new_weight {
            edge.weight = weight;
        }

        let new_id = edge.id();
        if new_id != current_id && graph.edges.iter().any(|other| other.id() == new_id) {
            return Err(Error::Validation(format!("edge already exists: {new_id}")));
        }

        graph.edges[position] = edge.clone();
        updated.push(edge);
    }

    store.save(&graph)?;
    debug!(count = updated.len(), "edges updated");
    Ok(updated)
}

/// Delete edges by triple.
///
/// Every key must name an existing edge; a missing key aborts the batch
/// before anything is written. Returns the count removed.
pub fn delete_edges(store: &mut GraphStore, keys: Vec<EdgeKey>) -> Result<usize> {
    let mut graph = store.load()?;

    let mut ids: HashSet<String> = HashSet::with_capacity(keys.len());
    for key in &keys {
        if graph.edge(key).is_none() {
            return Err(Error::NotFound(format!("edge not found: {}", key.id())));
        }
        ids.insert(key.id());
    }

    let before = graph.edges.len();
    graph.edges.retain(|edge| !ids.contains(&edge.id()));
    let removed = before - graph.edges.len();

    store.save(&graph)?;
    debug!(removed, "edges deleted");
    Ok(removed)
}

/// Query edges by any subset of `{from, to, edge_type}`.
///
/// With no filter the whole edge set is returned. With keys supplied the
/// candidate identifiers come from intersecting the store's indices and are
/// materialized through the id cache; results are sorted by identifier so
/// the output is deterministic. Equivalent to a linear scan with
/// [`EdgeFilter::matches`].
pub fn get_edges(store: &mut GraphStore, filter: &EdgeFilter) -> Result<Vec<Edge>> {
    let graph = store.load()?;

    if filter.is_empty() {
        return Ok(graph.edges);
    }

    let mut sets: Vec<&HashSet<String>> = Vec::new();
    if let Some(from) = &filter.from {
        match store.edge_ids_from(from) {
            Some(set) => sets.push(set),
            None => return Ok(Vec::new()),
        }
    }
    if let Some(to) = &filter.to {
        match store.edge_ids_to(to) {
            Some(set) => sets.push(set),
            None => return Ok(Vec::new()),
        }
    }
    if let Some(edge_type) = &filter.edge_type {
        match store.edge_ids_of_type(edge_type) {
            Some(set) => sets.push(set),
            None => return Ok(Vec::new()),
        }
    }

    // Intersect smallest-first to keep the candidate set tight.
    sets.sort_by_key(|set| set.len());
    let (first, rest) = match sets.split_first() {
        Some(split) => split,
        None => return Ok(Vec::new()),
    };

    let mut ids: Vec<String> = first
        .iter()
        .filter(|id| rest.iter().all(|set| set.contains(*id)))
        .cloned()
        .collect();
    ids.sort();

    Ok(store.edges_by_id(&ids))
}
