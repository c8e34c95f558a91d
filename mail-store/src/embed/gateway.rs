use std::sync::Arc;

use llm_gateway::LlmServiceProfiles;
use tracing::trace;

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::StoreError;

/// [`EmbeddingsProvider`] backed by the embedding profile of the model gateway.
pub struct GatewayEmbedder {
    svc: Arc<LlmServiceProfiles>,
    expected_dim: Option<usize>,
}

impl GatewayEmbedder {
    /// `expected_dim`, when set, rejects vectors of any other size.
    pub fn new(svc: Arc<LlmServiceProfiles>, expected_dim: Option<usize>) -> Self {
        Self { svc, expected_dim }
    }
}

impl EmbeddingsProvider for GatewayEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move {
            trace!(len = text.len(), "GatewayEmbedder::embed");
            let v = self.svc.embed(text).await?;
            if let Some(want) = self.expected_dim {
                if v.len() != want {
                    return Err(StoreError::VectorSizeMismatch {
                        collection: "query",
                        got: v.len(),
                        want,
                    });
                }
            }
            Ok(v)
        })
    }
}
