//! Ingestion pipeline: records → normalize → resolve vectors → insert per collection.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::ContentStore;
use crate::embed::EmbeddingPolicy;
use crate::embed_pool::{Embeddable, embed_missing};
use crate::errors::StoreError;
use crate::io_jsonl::IngestRecord;
use crate::normalize::normalize_text;
use crate::record::{CollectionKind, ContentChunk, MetaValue, Metadata, TYPE_KEY, meta_str};

/// Counters of one ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub read: usize,
    /// Records whose text was empty after normalization.
    pub dropped_empty: usize,
    pub inserted: usize,
    /// Records whose id already existed.
    pub skipped_duplicates: usize,
}

/// Record after normalization, waiting for its vector.
struct Draft {
    collection: CollectionKind,
    id: String,
    text: String,
    metadata: Metadata,
    embedding: Option<Vec<f32>>,
}

impl Embeddable for Draft {
    fn text(&self) -> &str {
        &self.text
    }
    fn embedding_slot(&mut self) -> &mut Option<Vec<f32>> {
        &mut self.embedding
    }
}

/// Ingests already-chunked records into their collections.
pub async fn ingest_records(
    store: &ContentStore,
    records: Vec<IngestRecord>,
    policy: EmbeddingPolicy<'_>,
) -> Result<IngestReport, StoreError> {
    let cfg = store.config();
    let mut report = IngestReport {
        read: records.len(),
        ..IngestReport::default()
    };

    // Running offsets per (source, kind) for records without an explicit offset.
    let mut offsets: HashMap<(String, String), u64> = HashMap::new();
    let mut drafts: Vec<Draft> = Vec::with_capacity(records.len());

    for r in records {
        let text = normalize_text(&r.text, cfg.max_chars);
        if text.is_empty() {
            report.dropped_empty += 1;
            continue;
        }

        let mut metadata: Metadata = r
            .metadata
            .iter()
            .filter_map(|(k, v)| MetaValue::from_json(v).map(|mv| (k.clone(), mv)))
            .collect();
        if meta_str(&metadata, TYPE_KEY).is_none() {
            metadata.insert(TYPE_KEY.into(), r.collection.type_tag().into());
        }

        let id = match r.id.filter(|s| !s.trim().is_empty()) {
            Some(id) => id,
            None => {
                let source = r
                    .source
                    .clone()
                    .or_else(|| source_from_metadata(&metadata))
                    .unwrap_or_else(|| "unknown".to_string());
                let kind = meta_str(&metadata, TYPE_KEY)
                    .unwrap_or(r.collection.type_tag())
                    .to_string();
                let next = offsets.entry((source.clone(), kind.clone())).or_insert(0);
                let offset = r.offset.unwrap_or(*next);
                *next = offset + 1;
                chunk_id(&source, &kind, offset)
            }
        };

        let embedding = if policy.keeps_precomputed() {
            r.embedding.filter(|v| !v.is_empty())
        } else {
            None
        };

        drafts.push(Draft {
            collection: r.collection,
            id,
            text,
            metadata,
            embedding,
        });
    }

    if drafts.is_empty() {
        debug!("ingest_records: nothing to insert");
        return Ok(report);
    }

    embed_missing(
        &mut drafts,
        policy.provider(),
        cfg.embedding_dim,
        cfg.embedding_concurrency,
    )
    .await?;

    let mut per_collection: HashMap<CollectionKind, Vec<ContentChunk>> = HashMap::new();
    for d in drafts {
        let embedding = d.embedding.ok_or(StoreError::MissingEmbedding)?;
        per_collection
            .entry(d.collection)
            .or_default()
            .push(ContentChunk {
                id: d.id,
                text: d.text,
                embedding,
                metadata: d.metadata,
            });
    }

    for kind in CollectionKind::ALL {
        if let Some(chunks) = per_collection.remove(&kind) {
            let r = store.collection(kind).insert(chunks).await?;
            report.inserted += r.inserted;
            report.skipped_duplicates += r.skipped;
        }
    }

    info!(
        read = report.read,
        inserted = report.inserted,
        dropped_empty = report.dropped_empty,
        skipped_duplicates = report.skipped_duplicates,
        "ingestion finished"
    );
    Ok(report)
}

/// Stable chunk id: `source:kind:offset`.
pub fn chunk_id(source: &str, kind: &str, offset: u64) -> String {
    format!("{source}:{kind}:{offset}")
}

fn source_from_metadata(metadata: &Metadata) -> Option<String> {
    ["message_id", "filename", "subject"]
        .iter()
        .find_map(|k| meta_str(metadata, k))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;
    use crate::embed::noop_embedder::NoopEmbedder;
    use crate::embed::{EmbedFuture, EmbeddingsProvider};
    use crate::io_jsonl::parse_records;

    struct LenEmbedder;

    impl EmbeddingsProvider for LenEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
            Box::pin(async move { Ok::<_, StoreError>(vec![text.len() as f32, 1.0]) })
        }
    }

    #[tokio::test]
    async fn fills_type_derives_ids_and_drops_empty_text() {
        let src = concat!(
            r#"{"collection":"attachments_semantic","text":"page one","source":"r.pdf","metadata":{"page":1}}"#,
            "\n",
            r#"{"collection":"attachments_semantic","text":"page  two","source":"r.pdf","metadata":{"page":2}}"#,
            "\n",
            r#"{"collection":"mail_bodies","text":"   ","metadata":{"subject":"empty"}}"#,
            "\n",
        );
        let store = ContentStore::new(StoreConfig::default()).unwrap();
        let records = parse_records(src.as_bytes()).unwrap();
        let report = ingest_records(&store, records, EmbeddingPolicy::PrecomputedOr(&LenEmbedder))
            .await
            .unwrap();

        assert_eq!(report.read, 3);
        assert_eq!(report.dropped_empty, 1);
        assert_eq!(report.inserted, 2);

        let c = store.collection(CollectionKind::AttachmentsSemantic);
        let second = c.get("r.pdf:attachment_pdf:1").await.unwrap();
        assert_eq!(second.text, "page two");
        assert_eq!(
            second.metadata.get(TYPE_KEY),
            Some(&MetaValue::Text("attachment_pdf".into()))
        );
    }

    #[tokio::test]
    async fn reingesting_the_same_dump_is_a_no_op() {
        let src = r#"{"id":"m1","collection":"mail_bodies","text":"hello","embedding":[1.0,0.0]}"#;
        let store = ContentStore::new(StoreConfig::default()).unwrap();
        for expected in [1usize, 0] {
            let records = parse_records(src.as_bytes()).unwrap();
            let r = ingest_records(&store, records, EmbeddingPolicy::PrecomputedOr(&LenEmbedder))
                .await
                .unwrap();
            assert_eq!(r.inserted, expected);
        }
        assert_eq!(store.collection(CollectionKind::MailBodies).len().await, 1);
    }

    #[tokio::test]
    async fn provider_only_ignores_precomputed_vectors() {
        let src = r#"{"id":"m1","collection":"mail_bodies","text":"hello","embedding":[9.0,9.0]}"#;
        let store = ContentStore::new(StoreConfig::default()).unwrap();
        let records = parse_records(src.as_bytes()).unwrap();
        ingest_records(&store, records, EmbeddingPolicy::ProviderOnly(&LenEmbedder))
            .await
            .unwrap();
        let chunk = store.collection(CollectionKind::MailBodies).get("m1").await.unwrap();
        assert_eq!(chunk.embedding, vec![5.0, 1.0]);
    }

    #[tokio::test]
    async fn precomputed_dump_needs_no_provider() {
        let src = concat!(
            r#"{"id":"m1","collection":"mail_bodies","text":"hello","embedding":[1.0,0.0]}"#,
            "\n",
            r#"{"id":"m2","collection":"mail_bodies","text":"no vector"}"#,
            "\n",
        );
        let store = ContentStore::new(StoreConfig::default()).unwrap();
        let records = parse_records(src.as_bytes()).unwrap();
        let err = ingest_records(&store, records, EmbeddingPolicy::PrecomputedOr(&NoopEmbedder))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingEmbedding));
        assert_eq!(store.collection(CollectionKind::MailBodies).len().await, 0);

        let records = parse_records(src.lines().next().unwrap_or_default().as_bytes()).unwrap();
        let r = ingest_records(&store, records, EmbeddingPolicy::PrecomputedOr(&NoopEmbedder))
            .await
            .unwrap();
        assert_eq!(r.inserted, 1);
    }
}
