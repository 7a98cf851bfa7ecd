//! Search, open, and full-read behavior, including neighbor expansion.

mod helpers;

use engram::Graph;
use helpers::*;

fn seeded() -> (tempfile::TempDir, engram::Engram) {
    let (tmp, mut engram) = test_engram();
    engram
        .add_nodes(vec![
            node("Grak", "npc", &["Race: Orc", "Demeanor: Gruff"]),
            node("Lurtz", "npc", &["Race: Uruk"]),
            node("Old Mine", "location", &["Terrain: Tunnels"]),
            node("Lava Pit", "location", &[]),
        ])
        .unwrap();
    engram
        .add_edges(vec![
            edge("Grak", "Old Mine", "located_in"),
            edge("Lurtz", "Grak", "ally_of"),
            edge("Old Mine", "Lava Pit", "connects_to"),
        ])
        .unwrap();
    (tmp, engram)
}

fn sorted_names(graph: &Graph) -> Vec<&str> {
    let mut names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    names.sort();
    names
}

#[test]
fn search_returns_matches_plus_direct_neighbors() {
    let (_tmp, mut engram) = seeded();

    let result = engram.search_nodes("orc").unwrap();
    // "orc" matches Grak's metadata; Old Mine and Lurtz come along as
    // neighbors, but the mine-to-pit edge stays out.
    assert_eq!(sorted_names(&result), vec!["Grak", "Lurtz", "Old Mine"]);
    assert_eq!(result.edges.len(), 2);
    assert!(result.edges.iter().all(|e| e.touches("Grak")));
}

#[test]
fn search_matches_name_type_and_metadata() {
    let (_tmp, mut engram) = seeded();

    assert!(sorted_names(&engram.search_nodes("lurtz").unwrap()).contains(&"Lurtz"));
    assert!(sorted_names(&engram.search_nodes("LOCATION").unwrap()).contains(&"Lava Pit"));
    assert!(sorted_names(&engram.search_nodes("tunnels").unwrap()).contains(&"Old Mine"));
}

#[test]
fn search_with_no_match_is_empty_not_an_error() {
    let (_tmp, mut engram) = seeded();
    let result = engram.search_nodes("balrog").unwrap();
    assert!(result.nodes.is_empty());
    assert!(result.edges.is_empty());
}

#[test]
fn open_nodes_expands_like_search() {
    let (_tmp, mut engram) = seeded();

    let result = engram.open_nodes(&["Grak".to_string()]).unwrap();
    assert_eq!(sorted_names(&result), vec!["Grak", "Lurtz", "Old Mine"]);
}

#[test]
fn open_nodes_skips_unknown_names_but_rejects_empty_input() {
    let (_tmp, mut engram) = seeded();

    let result = engram
        .open_nodes(&["Lava Pit".to_string(), "Balrog".to_string()])
        .unwrap();
    assert_eq!(sorted_names(&result), vec!["Lava Pit", "Old Mine"]);

    assert!(engram.open_nodes(&[]).unwrap_err().is_validation());
}

#[test]
fn read_graph_returns_the_whole_store() {
    let (_tmp, mut engram) = seeded();
    let graph = engram.read_graph().unwrap();
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 3);
}
