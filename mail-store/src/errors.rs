//! Unified error type for the crate.

use thiserror::Error;

/// Top-level error for mail-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O or filesystem errors.
    #[error("[Mail Store] io error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSONL row failed to deserialize.
    #[error("[Mail Store] parse error on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid or unsupported configuration.
    #[error("[Mail Store] config error: {0}")]
    Config(String),

    /// Vector dimensionality differs from the collection's.
    #[error("[Mail Store] vector size mismatch in {collection}: got {got}, want {want}")]
    VectorSizeMismatch {
        collection: &'static str,
        got: usize,
        want: usize,
    },

    /// Missing embedding and no provider able to compute one.
    #[error("[Mail Store] missing embedding and no provider supplied")]
    MissingEmbedding,

    /// A chunk reached insertion with empty text.
    #[error("[Mail Store] chunk {0} has empty text")]
    EmptyText(String),

    /// The embedding provider failed.
    #[error("[Mail Store] embedding failed: {0}")]
    Embedding(String),

    /// Collection name did not match any known collection.
    #[error("[Mail Store] unknown collection: {0}")]
    UnknownCollection(String),
}

impl From<llm_gateway::LlmError> for StoreError {
    fn from(e: llm_gateway::LlmError) -> Self {
        StoreError::Embedding(e.to_string())
    }
}
