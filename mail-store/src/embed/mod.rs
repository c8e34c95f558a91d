use crate::errors::StoreError;
use std::{future::Future, pin::Pin};

pub mod gateway;
pub mod noop_embedder;

/// Boxed future returned by [`EmbeddingsProvider::embed`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, StoreError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// The same provider (same model) must embed chunks at ingest and questions
/// at query time. Failures are errors, never zero vectors.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;
}

/// How embeddings are obtained during ingestion.
#[derive(Clone, Copy)]
pub enum EmbeddingPolicy<'a> {
    /// Use precomputed embeddings if available, otherwise call the provider.
    PrecomputedOr(&'a dyn EmbeddingsProvider),
    /// Always call the provider (ignores precomputed vectors).
    ProviderOnly(&'a dyn EmbeddingsProvider),
}

impl<'a> EmbeddingPolicy<'a> {
    pub fn provider(&self) -> &'a dyn EmbeddingsProvider {
        match *self {
            EmbeddingPolicy::PrecomputedOr(p) | EmbeddingPolicy::ProviderOnly(p) => p,
        }
    }

    pub fn keeps_precomputed(&self) -> bool {
        matches!(self, EmbeddingPolicy::PrecomputedOr(_))
    }
}
