//! Embedding executor with concurrency and dimension checks.

use crate::{embed::EmbeddingsProvider, errors::StoreError};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// Anything with text and an optional embedding slot.
pub trait Embeddable {
    fn text(&self) -> &str;
    fn embedding_slot(&mut self) -> &mut Option<Vec<f32>>;
}

/// Embeds texts of items that have no vector yet.
///
/// - `expected_dim`: if `Some`, enforces this vector size.
/// - `concurrency`: maximum number of concurrent embedding calls.
///
/// Fails on the first provider error; nothing is written in that case.
pub async fn embed_missing<T: Embeddable>(
    items: &mut [T],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
) -> Result<usize, StoreError> {
    let idxs: Vec<usize> = items
        .iter_mut()
        .enumerate()
        .filter_map(|(i, r)| r.embedding_slot().is_none().then_some(i))
        .collect();

    if idxs.is_empty() {
        debug!("embed_missing: nothing to embed");
        return Ok(0);
    }
    info!(
        missing = idxs.len(),
        total = items.len(),
        concurrency,
        "embed_missing: embedding chunks"
    );

    let texts: Vec<(usize, String)> = idxs
        .into_iter()
        .map(|i| (i, items[i].text().to_string()))
        .collect();

    let results: Vec<(usize, Vec<f32>)> = stream::iter(texts)
        .map(|(i, text)| async move {
            let v = provider.embed(&text).await?;
            Ok::<(usize, Vec<f32>), StoreError>((i, v))
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, StoreError>>()?;

    if let Some(want) = expected_dim {
        if let Some((_, v)) = results.iter().find(|(_, v)| v.len() != want) {
            return Err(StoreError::VectorSizeMismatch {
                collection: "ingest",
                got: v.len(),
                want,
            });
        }
    }

    let filled = results.len();
    for (i, v) in results {
        *items[i].embedding_slot() = Some(v);
    }

    debug!(filled, "embed_missing: embeddings filled");
    Ok(filled)
}
