//! One in-memory, append-only collection with cosine search.
//!
//! The lock is only taken around in-memory work; callers embed before
//! touching the collection.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::errors::StoreError;
use crate::filters;
use crate::record::{CollectionKind, ContentChunk, RagFilter, RagHit};
use crate::similarity::cosine;

/// Outcome of a bulk insert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    /// Ids already present (in the collection or earlier in the batch).
    pub skipped: usize,
}

#[derive(Default)]
struct State {
    dim: Option<usize>,
    chunks: Vec<ContentChunk>,
    ids: HashMap<String, usize>,
}

pub struct Collection {
    kind: CollectionKind,
    pinned_dim: Option<usize>,
    state: RwLock<State>,
}

impl Collection {
    /// Creates an empty collection; `pinned_dim` fixes the vector size up front.
    pub fn new(kind: CollectionKind, pinned_dim: Option<usize>) -> Self {
        Self {
            kind,
            pinned_dim,
            state: RwLock::new(State {
                dim: pinned_dim,
                ..State::default()
            }),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Inserts chunks with caller-supplied embeddings.
    ///
    /// The whole batch is validated before anything is written: a chunk with
    /// empty text, an empty embedding or a foreign dimension fails the batch.
    /// Existing ids are skipped and never overwritten.
    pub async fn insert(&self, chunks: Vec<ContentChunk>) -> Result<InsertReport, StoreError> {
        let mut st = self.state.write().await;

        let want = st
            .dim
            .or_else(|| chunks.first().map(|c| c.embedding.len()));
        for c in &chunks {
            if c.text.trim().is_empty() {
                return Err(StoreError::EmptyText(c.id.clone()));
            }
            if c.embedding.is_empty() {
                return Err(StoreError::MissingEmbedding);
            }
            if let Some(want) = want {
                if c.embedding.len() != want {
                    return Err(StoreError::VectorSizeMismatch {
                        collection: self.kind.name(),
                        got: c.embedding.len(),
                        want,
                    });
                }
            }
        }

        let mut report = InsertReport::default();
        for c in chunks {
            if st.ids.contains_key(&c.id) {
                trace!(collection = %self.kind, id = %c.id, "duplicate id skipped");
                report.skipped += 1;
                continue;
            }
            let idx = st.chunks.len();
            st.ids.insert(c.id.clone(), idx);
            st.chunks.push(c);
            report.inserted += 1;
        }
        if report.inserted > 0 {
            st.dim = want;
        }

        debug!(
            collection = %self.kind,
            inserted = report.inserted,
            skipped = report.skipped,
            total = st.chunks.len(),
            "collection insert"
        );
        Ok(report)
    }

    /// Returns up to `k` hits by descending cosine similarity.
    ///
    /// Ties keep insertion order. An empty collection yields no hits.
    pub async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&RagFilter>,
    ) -> Result<Vec<RagHit>, StoreError> {
        let st = self.state.read().await;
        if st.chunks.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(want) = st.dim {
            if vector.len() != want {
                return Err(StoreError::VectorSizeMismatch {
                    collection: self.kind.name(),
                    got: vector.len(),
                    want,
                });
            }
        }

        let mut scored: Vec<(f32, usize)> = st
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| filter.is_none_or(|f| filters::matches(f, &c.metadata)))
            .map(|(i, c)| (cosine(vector, &c.embedding), i))
            .collect();
        // `sort_by` is stable, so equal scores stay in insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k.max(1));

        Ok(scored
            .into_iter()
            .map(|(score, i)| {
                let c = &st.chunks[i];
                RagHit {
                    score,
                    id: c.id.clone(),
                    text: c.text.clone(),
                    metadata: c.metadata.clone(),
                }
            })
            .collect())
    }

    /// Looks a chunk up by id.
    pub async fn get(&self, id: &str) -> Option<ContentChunk> {
        let st = self.state.read().await;
        st.ids.get(id).map(|&i| st.chunks[i].clone())
    }

    /// Removes every chunk; a pinned dimension survives the reset.
    pub async fn reset(&self) {
        let mut st = self.state.write().await;
        *st = State {
            dim: self.pinned_dim,
            ..State::default()
        };
        debug!(collection = %self.kind, "collection reset");
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.chunks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current vector dimension, if fixed.
    pub async fn dim(&self) -> Option<usize> {
        self.state.read().await.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;

    fn chunk(id: &str, v: Vec<f32>) -> ContentChunk {
        ContentChunk {
            id: id.into(),
            text: format!("text {id}"),
            embedding: v,
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn duplicates_are_skipped_not_overwritten() {
        let c = Collection::new(CollectionKind::MailBodies, None);
        c.insert(vec![chunk("a", vec![1.0, 0.0])]).await.unwrap();

        let mut dup = chunk("a", vec![0.0, 1.0]);
        dup.text = "changed".into();
        let r = c.insert(vec![dup, chunk("b", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(r, InsertReport { inserted: 1, skipped: 1 });
        assert_eq!(c.get("a").await.map(|x| x.text), Some("text a".into()));
    }

    #[tokio::test]
    async fn first_insert_fixes_dimension() {
        let c = Collection::new(CollectionKind::AttachmentsSemantic, None);
        c.insert(vec![chunk("a", vec![1.0, 0.0])]).await.unwrap();
        let err = c.insert(vec![chunk("b", vec![1.0, 0.0, 0.0])]).await;
        assert!(matches!(err, Err(StoreError::VectorSizeMismatch { got: 3, want: 2, .. })));

        let err = c.search(&[1.0], 1, None).await;
        assert!(matches!(err, Err(StoreError::VectorSizeMismatch { .. })));
    }

    #[tokio::test]
    async fn failed_batch_writes_nothing() {
        let c = Collection::new(CollectionKind::MailBodies, Some(2));
        let err = c
            .insert(vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0])])
            .await;
        assert!(err.is_err());
        assert!(c.is_empty().await);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let c = Collection::new(CollectionKind::MailBodies, None);
        c.insert(vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("other", vec![0.0, 1.0]),
            chunk("second", vec![2.0, 0.0]),
        ])
        .await
        .unwrap();

        let hits = c.search(&[1.0, 0.0], 2, None).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn reset_keeps_pinned_dim() {
        let c = Collection::new(CollectionKind::MailBodies, Some(2));
        c.insert(vec![chunk("a", vec![1.0, 0.0])]).await.unwrap();
        c.reset().await;
        assert_eq!(c.len().await, 0);
        assert_eq!(c.dim().await, Some(2));
    }
}
