//! In-memory content store for mail bodies and attachments.
//!
//! Three disjoint collections (`mail_bodies`, `attachments_semantic`,
//! `attachments_tabular_idx`) hold pre-chunked text with caller-supplied
//! embeddings. The crate provides:
//! - ingestion of JSONL records with precomputed or on-the-fly embeddings
//! - top-k cosine retrieval with optional metadata equality filters
//!
//! The store is an explicit object: build it once, wrap it in `Arc` and pass
//! it to the components that need it.

mod collection;
mod config;
pub mod embed;
mod embed_pool;
mod errors;
mod filters;
mod ingest;
mod io_jsonl;
mod normalize;
pub mod record;
mod retrieve;
mod similarity;

pub use collection::{Collection, InsertReport};
pub use config::StoreConfig;
pub use embed::{EmbeddingPolicy, EmbeddingsProvider};
pub use errors::StoreError;
pub use ingest::{IngestReport, chunk_id};
pub use io_jsonl::{IngestRecord, parse_records, read_records};
pub use record::{CollectionKind, ContentChunk, MetaValue, Metadata, RagFilter, RagHit, RagQuery};

use tracing::{info, trace};

/// Facade over the three collections.
pub struct ContentStore {
    cfg: StoreConfig,
    mail_bodies: Collection,
    attachments_semantic: Collection,
    attachments_tabular_idx: Collection,
}

impl ContentStore {
    /// Creates an empty store.
    ///
    /// # Errors
    /// Returns `StoreError::Config` for invalid configuration.
    pub fn new(cfg: StoreConfig) -> Result<Self, StoreError> {
        cfg.validate()?;
        let dim = cfg.embedding_dim;
        Ok(Self {
            mail_bodies: Collection::new(CollectionKind::MailBodies, dim),
            attachments_semantic: Collection::new(CollectionKind::AttachmentsSemantic, dim),
            attachments_tabular_idx: Collection::new(CollectionKind::AttachmentsTabularIdx, dim),
            cfg,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        match kind {
            CollectionKind::MailBodies => &self.mail_bodies,
            CollectionKind::AttachmentsSemantic => &self.attachments_semantic,
            CollectionKind::AttachmentsTabularIdx => &self.attachments_tabular_idx,
        }
    }

    /// Inserts chunks whose embeddings are already computed.
    pub async fn insert(
        &self,
        kind: CollectionKind,
        chunks: Vec<ContentChunk>,
    ) -> Result<InsertReport, StoreError> {
        self.collection(kind).insert(chunks).await
    }

    /// Ingests parsed records.
    pub async fn ingest_records(
        &self,
        records: Vec<IngestRecord>,
        policy: EmbeddingPolicy<'_>,
    ) -> Result<IngestReport, StoreError> {
        ingest::ingest_records(self, records, policy).await
    }

    /// Ingests a JSONL file of records.
    ///
    /// # Errors
    /// I/O, parse, embedding and vector size errors.
    pub async fn ingest_file(
        &self,
        jsonl_path: impl AsRef<std::path::Path>,
        policy: EmbeddingPolicy<'_>,
    ) -> Result<IngestReport, StoreError> {
        trace!("ContentStore::ingest_file path={:?}", jsonl_path.as_ref());
        let records = io_jsonl::read_records(jsonl_path)?;
        self.ingest_records(records, policy).await
    }

    /// Top-k retrieval over one collection.
    pub async fn top_k(
        &self,
        kind: CollectionKind,
        query: RagQuery<'_>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<RagHit>, StoreError> {
        retrieve::top_k(self.collection(kind), query, provider).await
    }

    /// Clears all three collections.
    pub async fn reset_all(&self) {
        for kind in CollectionKind::ALL {
            self.collection(kind).reset().await;
        }
        info!("content store reset");
    }

    /// `(collection, len)` for every collection.
    pub async fn stats(&self) -> Vec<(CollectionKind, usize)> {
        let mut out = Vec::with_capacity(3);
        for kind in CollectionKind::ALL {
            out.push((kind, self.collection(kind).len().await));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbedFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bag-of-keywords embedder: one dimension per keyword.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    const KEYWORDS: [&str; 4] = ["invoice", "meeting", "budget", "travel"];

    impl EmbeddingsProvider for KeywordEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            let v: Vec<f32> = KEYWORDS
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect();
            Box::pin(async move { Ok::<_, StoreError>(v) })
        }
    }

    fn embedder() -> KeywordEmbedder {
        KeywordEmbedder {
            calls: AtomicUsize::new(0),
        }
    }

    async fn seeded() -> ContentStore {
        let src = concat!(
            r#"{"id":"a","collection":"mail_bodies","text":"invoice attached","metadata":{"subject":"Invoice"}}"#,
            "\n",
            r#"{"id":"b","collection":"mail_bodies","text":"meeting about the budget","metadata":{"subject":"Sync"}}"#,
            "\n",
            r#"{"id":"c","collection":"mail_bodies","text":"invoice and budget invoice","metadata":{"subject":"Re: Invoice"}}"#,
            "\n",
            r#"{"id":"d","collection":"mail_bodies","text":"travel plans","metadata":{"subject":"Trip"}}"#,
            "\n",
        );
        let store = ContentStore::new(StoreConfig::default()).unwrap();
        let e = embedder();
        store
            .ingest_records(
                parse_records(src.as_bytes()).unwrap(),
                EmbeddingPolicy::ProviderOnly(&e),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn empty_collection_returns_no_hits() {
        let store = ContentStore::new(StoreConfig::default()).unwrap();
        let e = embedder();
        let q = RagQuery {
            text: "anything",
            top_k: 5,
            filter: None,
        };
        let hits = store
            .top_k(CollectionKind::AttachmentsSemantic, q, &e)
            .await
            .unwrap();
        assert!(hits.is_empty());
        assert_eq!(e.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_queries_return_identical_order() {
        let store = seeded().await;
        let e = embedder();
        let run = || async {
            let q = RagQuery {
                text: "invoice",
                top_k: 3,
                filter: None,
            };
            store
                .top_k(CollectionKind::MailBodies, q, &e)
                .await
                .unwrap()
                .into_iter()
                .map(|h| h.id)
                .collect::<Vec<_>>()
        };
        let first = run().await;
        assert_eq!(first[0], "a");
        assert_eq!(first.len(), 3);
        for _ in 0..5 {
            assert_eq!(run().await, first);
        }
    }

    #[tokio::test]
    async fn zero_k_is_raised_and_filters_narrow_candidates() {
        let store = seeded().await;
        let e = embedder();
        let q = RagQuery {
            text: "invoice",
            top_k: 0,
            filter: Some(RagFilter::field_eq("subject", "Re: Invoice")),
        };
        let hits = store.top_k(CollectionKind::MailBodies, q, &e).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "c");
    }

    #[tokio::test]
    async fn reset_all_clears_every_collection() {
        let store = seeded().await;
        store.reset_all().await;
        assert!(store.stats().await.iter().all(|(_, n)| *n == 0));
    }
}
