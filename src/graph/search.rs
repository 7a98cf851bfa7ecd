//! Read-only queries: substring search, exact-name retrieval, full reads.
//!
//! Search and open results are neighbor-expanded: the returned graph holds
//! every matched node plus its direct neighbors, and every edge with at
//! least one matched endpoint. Edges between two unmatched neighbors are
//! left out, so the result shows the matched nodes' surroundings without
//! dragging in the neighbors' own relationships.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;
use crate::graph::types::{Graph, Node};

/// Case-insensitive substring search over node names, types, and metadata
/// entries, with neighbor expansion.
pub fn search_nodes(store: &mut GraphStore, query: &str) -> Result<Graph> {
    let graph = store.load()?;
    let needle = query.to_lowercase();
    let matched: HashSet<&str> = graph
        .nodes
        .iter()
        .filter(|node| node_matches(node, &needle))
        .map(|node| node.name.as_str())
        .collect();

    let result = expand(&graph, &matched);
    debug!(
        query,
        matched = matched.len(),
        returned = result.nodes.len(),
        "search complete"
    );
    Ok(result)
}

fn node_matches(node: &Node, needle: &str) -> bool {
    node.name.to_lowercase().contains(needle)
        || node.node_type.to_lowercase().contains(needle)
        || node
            .metadata
            .iter()
            .any(|entry| entry.to_lowercase().contains(needle))
}

/// Exact-name retrieval with the same neighbor expansion as search.
///
/// Names with no matching node are ignored; an empty `names` list is a
/// validation error.
pub fn open_nodes(store: &mut GraphStore, names: &[String]) -> Result<Graph> {
    if names.is_empty() {
        return Err(Error::Validation("names must not be empty".into()));
    }

    let graph = store.load()?;
    let requested: HashSet<&str> = names.iter().map(String::as_str).collect();
    let matched: HashSet<&str> = graph
        .nodes
        .iter()
        .map(|node| node.name.as_str())
        .filter(|name| requested.contains(name))
        .collect();

    Ok(expand(&graph, &matched))
}

/// The full graph, unfiltered.
pub fn read_graph(store: &mut GraphStore) -> Result<Graph> {
    store.load()
}

/// Build the result graph for a matched set: the matched nodes, their
/// direct neighbors, and every edge touching a matched node.
fn expand(graph: &Graph, matched: &HashSet<&str>) -> Graph {
    let mut keep: HashSet<&str> = matched.clone();
    let mut edges = Vec::new();

    for edge in &graph.edges {
        if matched.contains(edge.from.as_str()) || matched.contains(edge.to.as_str()) {
            keep.insert(edge.from.as_str());
            keep.insert(edge.to.as_str());
            edges.push(edge.clone());
        }
    }

    let nodes = graph
        .nodes
        .iter()
        .filter(|node| keep.contains(node.name.as_str()))
        .cloned()
        .collect();

    Graph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::add_edges;
    use crate::graph::nodes::add_nodes;
    use crate::graph::types::Edge;
    use tempfile::TempDir;

    // Grak lives in the Old Mine; Lurtz is allied with Grak; the Old Mine
    // connects to the Lava Pit. Matching "Grak" must pull in Old Mine and
    // Lurtz as neighbors but not the mine-to-pit edge.
    fn seeded_store() -> (TempDir, GraphStore) {
        let tmp = TempDir::new().unwrap();
        let mut store = GraphStore::open(tmp.path().join("graph.jsonl"), false).unwrap();
        add_nodes(
            &mut store,
            vec![
                Node::new("Grak", "npc").with_metadata(vec!["Race: Orc".into()]),
                Node::new("Lurtz", "npc").with_metadata(vec!["Race: Uruk".into()]),
                Node::new("Old Mine", "location"),
                Node::new("Lava Pit", "location"),
            ],
        )
        .unwrap();
        add_edges(
            &mut store,
            vec![
                Edge::new("Grak", "Old Mine", "located_in"),
                Edge::new("Lurtz", "Grak", "ally_of"),
                Edge::new("Old Mine", "Lava Pit", "connects_to"),
            ],
        )
        .unwrap();
        (tmp, store)
    }

    fn names(graph: &Graph) -> Vec<&str> {
        let mut names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        names.sort();
        names
    }

    #[test]
    fn search_expands_to_direct_neighbors() {
        let (_tmp, mut store) = seeded_store();
        let result = search_nodes(&mut store, "grak").unwrap();

        assert_eq!(names(&result), vec!["Grak", "Lurtz", "Old Mine"]);
        assert_eq!(result.edges.len(), 2);
        assert!(result
            .edges
            .iter()
            .all(|edge| edge.touches("Grak")));
    }

    #[test]
    fn search_covers_type_and_metadata() {
        let (_tmp, mut store) = seeded_store();

        let by_type = search_nodes(&mut store, "location").unwrap();
        assert!(names(&by_type).contains(&"Old Mine"));
        assert!(names(&by_type).contains(&"Lava Pit"));

        let by_metadata = search_nodes(&mut store, "uruk").unwrap();
        assert!(names(&by_metadata).contains(&"Lurtz"));
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_tmp, mut store) = seeded_store();
        let lower = search_nodes(&mut store, "old mine").unwrap();
        let upper = search_nodes(&mut store, "OLD MINE").unwrap();
        assert_eq!(names(&lower), names(&upper));
    }

    #[test]
    fn no_match_returns_empty_graph() {
        let (_tmp, mut store) = seeded_store();
        let result = search_nodes(&mut store, "dragon").unwrap();
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn open_nodes_ignores_unknown_names() {
        let (_tmp, mut store) = seeded_store();
        let result = open_nodes(
            &mut store,
            &["Lava Pit".to_string(), "ghost".to_string()],
        )
        .unwrap();
        assert_eq!(names(&result), vec!["Lava Pit", "Old Mine"]);
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn open_nodes_rejects_empty_input() {
        let (_tmp, mut store) = seeded_store();
        assert!(open_nodes(&mut store, &[]).unwrap_err().is_validation());
    }

    #[test]
    fn read_graph_returns_everything() {
        let (_tmp, mut store) = seeded_store();
        let graph = read_graph(&mut store).unwrap();
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 3);
    }
}
