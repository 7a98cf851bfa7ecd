//! Declarative entity schemas: document format, discovery, and the engine
//! that turns field data into node metadata and relationship edges.

pub mod engine;
pub mod registry;
pub mod types;
