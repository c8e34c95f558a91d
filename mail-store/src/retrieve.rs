//! Retrieval: embed the question, then rank one collection.

use tracing::{debug, trace};

use crate::collection::Collection;
use crate::embed::EmbeddingsProvider;
use crate::errors::StoreError;
use crate::record::{RagHit, RagQuery};

/// Returns up to `query.top_k` hits (at least one is requested) ordered by
/// descending cosine similarity.
///
/// An empty collection returns `[]` without calling the provider. The embed
/// call is awaited before the collection lock is taken.
pub async fn top_k(
    collection: &Collection,
    query: RagQuery<'_>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<RagHit>, StoreError> {
    let k = query.top_k.max(1);
    trace!(collection = %collection.kind(), k, filter = query.filter.is_some(), "retrieve::top_k");

    if collection.is_empty().await {
        debug!(collection = %collection.kind(), "empty collection");
        return Ok(Vec::new());
    }

    let qv = provider.embed(query.text).await?;
    let hits = collection.search(&qv, k, query.filter.as_ref()).await?;

    debug!(collection = %collection.kind(), hits = hits.len(), "retrieve::top_k done");
    Ok(hits)
}
