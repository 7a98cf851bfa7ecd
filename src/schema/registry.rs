//! Schema discovery: `*.schema.json` documents in a configured directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::types::EntitySchema;

/// Loaded entity schemas, keyed by entity type ([`EntitySchema::name`]).
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, EntitySchema>,
}

impl SchemaRegistry {
    /// An empty registry. Schema-backed entity operations fail against it
    /// with [`Error::Schema`]; everything else works without schemas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `dir` for `*.schema.json` files and load each one. A missing
    /// directory yields an empty registry; an unreadable or invalid
    /// document is an error. Other files in the directory are ignored.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();

        if !dir.is_dir() {
            debug!(dir = %dir.display(), "schema directory missing, no schemas loaded");
            return Ok(registry);
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(file_name) => file_name,
                None => continue,
            };
            if !file_name.ends_with(".schema.json") {
                continue;
            }

            let contents = fs::read_to_string(&path)?;
            let schema: EntitySchema = serde_json::from_str(&contents).map_err(|err| {
                Error::Schema(format!("invalid schema document {}: {err}", path.display()))
            })?;
            debug!(entity_type = %schema.name, file = file_name, "schema loaded");
            registry.schemas.insert(schema.name.clone(), schema);
        }

        info!(
            count = registry.schemas.len(),
            dir = %dir.display(),
            "schema registry loaded"
        );
        Ok(registry)
    }

    /// Register a schema directly, replacing any existing one for the same
    /// entity type.
    pub fn insert(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    /// Entity types with a loaded schema, in sorted order.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
