//! Store and ingestion configuration.

use llm_gateway::error_handler::env_parse;

use crate::errors::StoreError;

/// Configuration for the content store and ingestion pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Pins the vector dimension of every collection. `None` lets the first
    /// insert fix it per collection.
    pub embedding_dim: Option<usize>,
    /// Maximum number of concurrent embedding calls during ingestion.
    pub embedding_concurrency: usize,
    /// Normalized chunk text is cut at this many characters.
    pub max_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            embedding_dim: None,
            embedding_concurrency: 4,
            max_chars: 8000,
        }
    }
}

impl StoreConfig {
    /// Reads `EMBEDDING_DIM`, `EMBEDDING_CONCURRENCY`, `INGEST_MAX_CHARS`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            embedding_dim: std::env::var("EMBEDDING_DIM")
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok()),
            embedding_concurrency: env_parse("EMBEDDING_CONCURRENCY", d.embedding_concurrency),
            max_chars: env_parse("INGEST_MAX_CHARS", d.max_chars),
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.embedding_dim == Some(0) {
            return Err(StoreError::Config("embedding_dim must be > 0".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(StoreError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.max_chars == 0 {
            return Err(StoreError::Config("max_chars must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_zeroes_are_not() {
        assert!(StoreConfig::default().validate().is_ok());
        let bad = StoreConfig {
            embedding_dim: Some(0),
            ..StoreConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = StoreConfig {
            embedding_concurrency: 0,
            ..StoreConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
