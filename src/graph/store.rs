//! File-backed graph storage with derived edge indices.
//!
//! The backing file holds one JSON record per line, nodes first, then edges.
//! Every mutation rewrites the whole file through a sibling temp file and an
//! atomic rename, so a concurrent reader never observes a partial write.
//! Because the file is rewritten wholesale, the edge indices are rebuilt on
//! every load and save rather than maintained incrementally.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::graph::types::{Edge, Graph, GraphRecord, Node};

/// Owns the backing file and the lookup indices derived from it.
///
/// `load` and `save` take `&mut self`, so a load-mutate-save cycle holds
/// exclusive access for its whole duration. Callers that share a store
/// across threads wrap it in a `Mutex`.
pub struct GraphStore {
    path: PathBuf,
    lenient_load: bool,
    indices: EdgeIndices,
}

/// Secondary lookups over edges, keyed by composite id (`from|to|edgeType`).
#[derive(Debug, Default)]
struct EdgeIndices {
    by_source: HashMap<String, HashSet<String>>,
    by_target: HashMap<String, HashSet<String>>,
    by_type: HashMap<String, HashSet<String>>,
    edges_by_id: HashMap<String, Edge>,
}

impl EdgeIndices {
    fn rebuild(&mut self, edges: &[Edge]) {
        self.by_source.clear();
        self.by_target.clear();
        self.by_type.clear();
        self.edges_by_id.clear();

        for edge in edges {
            let id = edge.id();
            self.by_source
                .entry(edge.from.clone())
                .or_default()
                .insert(id.clone());
            self.by_target
                .entry(edge.to.clone())
                .or_default()
                .insert(id.clone());
            self.by_type
                .entry(edge.edge_type.clone())
                .or_default()
                .insert(id.clone());
            self.edges_by_id.insert(id, edge.clone());
        }
    }
}

/// Borrowing twin of [`GraphRecord`] so `save` can serialize without
/// cloning every node and edge.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordRef<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl GraphStore {
    /// Open a store at `path`, creating parent directories and performing an
    /// initial load so corrupt files surface immediately under strict
    /// loading. With `lenient_load`, unparseable lines are skipped with a
    /// warning instead.
    pub fn open(path: impl Into<PathBuf>, lenient_load: bool) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut store = Self {
            path,
            lenient_load,
            indices: EdgeIndices::default(),
        };
        let graph = store.load()?;
        info!(
            path = %store.path.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "graph store opened"
        );
        Ok(store)
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole graph and rebuild the edge indices.
    ///
    /// A missing file reads as an empty graph. Blank lines are skipped. A
    /// line that fails to parse aborts with [`Error::CorruptRecord`] under
    /// strict loading and is skipped with a warning under lenient loading.
    pub fn load(&mut self) -> Result<Graph> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.indices.rebuild(&[]);
                return Ok(Graph::default());
            }
            Err(err) => return Err(Error::Storage(err)),
        };

        let mut graph = Graph::default();
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: GraphRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(err) if self.lenient_load => {
                    warn!(line = idx + 1, error = %err, "skipping corrupt graph record");
                    continue;
                }
                Err(err) => {
                    return Err(Error::CorruptRecord {
                        line: idx + 1,
                        message: err.to_string(),
                    });
                }
            };
            match record {
                GraphRecord::Node(node) => graph.nodes.push(node),
                GraphRecord::Edge(edge) => graph.edges.push(edge),
            }
        }

        self.indices.rebuild(&graph.edges);
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "graph loaded"
        );
        Ok(graph)
    }

    /// Persist the whole graph, nodes first, then edges, one record per
    /// line with a trailing newline. Writes a sibling `.tmp` file and
    /// renames it over the target, then rebuilds the edge indices.
    pub fn save(&mut self, graph: &Graph) -> Result<()> {
        let mut out = String::new();
        for node in &graph.nodes {
            out.push_str(&serde_json::to_string(&RecordRef::Node(node))?);
            out.push('\n');
        }
        for edge in &graph.edges {
            out.push_str(&serde_json::to_string(&RecordRef::Edge(edge))?);
            out.push('\n');
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &self.path)?;

        self.indices.rebuild(&graph.edges);
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "graph saved"
        );
        Ok(())
    }

    /// Materialize edges for the given composite identifiers from the cache
    /// built during indexing. Unknown identifiers are skipped.
    pub fn edges_by_id(&self, ids: &[String]) -> Vec<Edge> {
        ids.iter()
            .filter_map(|id| self.indices.edges_by_id.get(id).cloned())
            .collect()
    }

    /// Identifiers of edges leaving `name`, if any.
    pub fn edge_ids_from(&self, name: &str) -> Option<&HashSet<String>> {
        self.indices.by_source.get(name)
    }

    /// Identifiers of edges arriving at `name`, if any.
    pub fn edge_ids_to(&self, name: &str) -> Option<&HashSet<String>> {
        self.indices.by_target.get(name)
    }

    /// Identifiers of edges carrying `edge_type`, if any.
    pub fn edge_ids_of_type(&self, edge_type: &str) -> Option<&HashSet<String>> {
        self.indices.by_type.get(edge_type)
    }
}
