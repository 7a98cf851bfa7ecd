//! Crate-wide error taxonomy.
//!
//! Operations distinguish four caller-visible classes: validation failures
//! (input rejected before any write), missing targets, storage faults, and
//! transaction-state misuse. The remaining variants cover record parsing,
//! configuration, and schema documents.

/// Errors returned by graph, transaction, and schema operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before anything was written: duplicate names or
    /// triples, empty identifiers, out-of-range weights, missing required
    /// fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// The named node or edge does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying file I/O failed. A missing graph file on load is not an
    /// error; it reads as an empty graph.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A persisted line failed to parse under strict loading.
    #[error("corrupt record at line {line}: {message}")]
    CorruptRecord { line: usize, message: String },

    /// A record could not be encoded for persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transaction API called in the wrong state: `begin` while one is
    /// active, or `commit`/`rollback` while idle.
    #[error("transaction error: {0}")]
    TransactionState(String),

    /// Configuration file unreadable or malformed.
    #[error("config error: {0}")]
    Config(String),

    /// Schema document invalid, or an operation named an entity type with
    /// no loaded schema.
    #[error("schema error: {0}")]
    Schema(String),
}

impl Error {
    /// `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// `true` for [`Error::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
