#![allow(dead_code)]

use engram::graph::store::GraphStore;
use engram::schema::registry::SchemaRegistry;
use engram::{Edge, Engram, Node};
use serde_json::{Map, Value};
use tempfile::TempDir;

/// Open a fresh engram over a temp directory with no schemas. The `TempDir`
/// must stay alive for the duration of the test.
pub fn test_engram() -> (TempDir, Engram) {
    let tmp = TempDir::new().unwrap();
    let store = GraphStore::open(tmp.path().join("graph.jsonl"), false).unwrap();
    (tmp, Engram::new(store, SchemaRegistry::new()))
}

/// Open a fresh engram with the given `(file name, contents)` schema
/// documents written to a schemas directory and loaded through discovery.
pub fn test_engram_with_schemas(schemas: &[(&str, &str)]) -> (TempDir, Engram) {
    let tmp = TempDir::new().unwrap();
    let schema_dir = tmp.path().join("schemas");
    std::fs::create_dir_all(&schema_dir).unwrap();
    for (file, contents) in schemas {
        std::fs::write(schema_dir.join(file), contents).unwrap();
    }

    let store = GraphStore::open(tmp.path().join("graph.jsonl"), false).unwrap();
    let registry = SchemaRegistry::load_dir(&schema_dir).unwrap();
    (tmp, Engram::new(store, registry))
}

pub fn node(name: &str, node_type: &str, metadata: &[&str]) -> Node {
    Node::new(name, node_type).with_metadata(metadata.iter().map(|s| s.to_string()).collect())
}

pub fn edge(from: &str, to: &str, edge_type: &str) -> Edge {
    Edge::new(from, to, edge_type)
}

/// Unwrap a `json!({...})` literal into the map the entity API takes.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// The NPC schema used by entity tests: `race` required, `demeanor` plain,
/// `location` and `allies` relationship-bearing.
pub const NPC_SCHEMA: &str = r#"{
    "name": "npc",
    "description": "A non-player character",
    "properties": {
        "name": { "type": "string", "description": "Unique character name", "required": true },
        "race": { "type": "string", "description": "Character race", "required": true },
        "demeanor": { "type": "string", "description": "General demeanor" },
        "location": {
            "type": "string",
            "description": "Where the character currently is",
            "relationship": { "edgeType": "located_in", "nodeType": "location" }
        },
        "allies": {
            "type": "array",
            "description": "Characters this NPC trusts",
            "relationship": { "edgeType": "ally_of", "nodeType": "npc" }
        }
    },
    "additionalProperties": true
}"#;

/// Minimal location schema so entity tests can create edge targets.
pub const LOCATION_SCHEMA: &str = r#"{
    "name": "location",
    "description": "A place in the world",
    "properties": {
        "name": { "type": "string", "description": "Unique place name", "required": true },
        "terrain": { "type": "string", "description": "Dominant terrain" }
    }
}"#;
