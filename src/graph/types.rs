//! Core graph types and the persisted record format.
//!
//! Nodes are keyed by a globally unique `name`. Edges are directed, typed,
//! and weighted, identified by their `(from, to, edge_type)` triple. On disk
//! both serialize as one self-describing JSON object per line, tagged with a
//! `"type"` field so a reader can parse each line independently.

use serde::{Deserialize, Serialize};

/// A named, typed entity carrying free-form `"Key: value"` metadata entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Globally unique primary key. Also the join key for edges.
    pub name: String,
    /// Category label, e.g. `"npc"` or `"location"`.
    pub node_type: String,
    /// Ordered `"Key: value"` entries. Exact duplicates are suppressed when
    /// appending but not when an update replaces the whole array.
    #[serde(default)]
    pub metadata: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A directed, typed, weighted relationship between two node names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Source node name.
    pub from: String,
    /// Target node name.
    pub to: String,
    /// Relationship label, e.g. `"located_in"`.
    pub edge_type: String,
    /// Strength in `[0.0, 1.0]`. Defaults to `1.0` when absent from input.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

pub(crate) fn default_weight() -> f64 {
    1.0
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: edge_type.into(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Deterministic composite identifier, `from|to|edgeType`.
    pub fn id(&self) -> String {
        edge_id(&self.from, &self.to, &self.edge_type)
    }

    /// `true` if `name` is either endpoint.
    pub fn touches(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

/// Composite edge identifier shared by the store indices and lookups.
pub fn edge_id(from: &str, to: &str, edge_type: &str) -> String {
    format!("{from}|{to}|{edge_type}")
}

/// The `(from, to, edge_type)` triple identifying one edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
    pub edge_type: String,
}

impl EdgeKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: edge_type.into(),
        }
    }

    /// Composite identifier, `from|to|edgeType`.
    pub fn id(&self) -> String {
        edge_id(&self.from, &self.to, &self.edge_type)
    }
}

impl From<&Edge> for EdgeKey {
    fn from(edge: &Edge) -> Self {
        Self {
            from: edge.from.clone(),
            to: edge.to.clone(),
            edge_type: edge.edge_type.clone(),
        }
    }
}

/// Partial update for a node, addressed by `name`.
///
/// `None` fields are left untouched. Supplying `metadata` replaces the whole
/// array; there is no per-entry merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<String>>,
}

/// Update for an edge addressed by its current triple.
///
/// Any of the three key fields may be renamed via the `new_*` variants; a
/// renamed endpoint must name an existing node, and the resulting triple
/// must stay unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    pub from: String,
    pub to: String,
    pub edge_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_weight: Option<f64>,
}

/// Filter for edge queries. Any subset of the three key fields; an empty
/// filter matches every edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeFilter {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub edge_type: Option<String>,
}

impl EdgeFilter {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.edge_type.is_none()
    }

    /// `true` if `edge` satisfies every supplied key.
    pub fn matches(&self, edge: &Edge) -> bool {
        self.from.as_deref().is_none_or(|from| edge.from == from)
            && self.to.as_deref().is_none_or(|to| edge.to == to)
            && self
                .edge_type
                .as_deref()
                .is_none_or(|edge_type| edge.edge_type == edge_type)
    }
}

/// The full in-memory graph: every node and edge in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|node| node.name == name)
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.iter().find(|edge| {
            edge.from == key.from && edge.to == key.to && edge.edge_type == key.edge_type
        })
    }
}

/// One line of the backing file: a node or an edge, tagged by `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphRecord {
    Node(Node),
    Edge(Edge),
}
