//! Metadata entries on nodes: append with dedup, exact-match delete, fetch.

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;

/// Append entries to the named node, skipping any already present (exact
/// string comparison, applied against the node and within the batch).
/// Returns the entries actually added.
pub fn add_metadata(
    store: &mut GraphStore,
    name: &str,
    entries: Vec<String>,
) -> Result<Vec<String>> {
    let mut graph = store.load()?;
    let node = match graph.node_mut(name) {
        Some(node) => node,
        None => return Err(Error::NotFound(format!("node not found: {name}"))),
    };

    let mut added = Vec::new();
    for entry in entries {
        if !node.metadata.contains(&entry) {
            node.metadata.push(entry.clone());
            added.push(entry);
        }
    }

    store.save(&graph)?;
    debug!(node = name, count = added.len(), "metadata added");
    Ok(added)
}

/// Remove entries matching exactly. Entries not present are ignored.
/// Returns the count removed.
pub fn delete_metadata(store: &mut GraphStore, name: &str, entries: &[String]) -> Result<usize> {
    let mut graph = store.load()?;
    let node = match graph.node_mut(name) {
        Some(node) => node,
        None => return Err(Error::NotFound(format!("node not found: {name}"))),
    };

    let before = node.metadata.len();
    node.metadata.retain(|entry| !entries.contains(entry));
    let removed = before - node.metadata.len();

    store.save(&graph)?;
    debug!(node = name, removed, "metadata deleted");
    Ok(removed)
}

/// The named node's metadata entries.
pub fn get_metadata(store: &mut GraphStore, name: &str) -> Result<Vec<String>> {
    let graph = store.load()?;
    match graph.node(name) {
        Some(node) => Ok(node.metadata.clone()),
        None => Err(Error::NotFound(format!("node not found: {name}"))),
    }
}
