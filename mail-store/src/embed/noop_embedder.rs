use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::StoreError;

/// Provider for dumps that ship every vector precomputed.
#[derive(Clone, Copy, Default)]
pub struct NoopEmbedder;

impl EmbeddingsProvider for NoopEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async { Err(StoreError::MissingEmbedding) })
    }
}
