//! Typed error for the mail-qa crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QaError {
    /// Embedding or lookup failure in the content store.
    #[error("retrieval error: {0}")]
    Store(#[from] mail_store::StoreError),

    /// Model call failed (timeout, provider error, transport).
    #[error("generation error: {0}")]
    Generation(#[from] llm_gateway::LlmError),

    /// Router reply had neither a JSON object nor a single route label.
    #[error("malformed router output: {0}")]
    MalformedRoute(String),

    /// The model answered with nothing but whitespace.
    #[error("model returned an empty answer")]
    EmptyAnswer,

    #[error("tabular error: {0}")]
    Tabular(#[from] tabular_engine::TabularError),

    #[error("config error: {0}")]
    Config(String),
}
