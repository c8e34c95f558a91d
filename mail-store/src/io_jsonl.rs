//! JSONL reader for pre-chunked ingestion records.
//!
//! One JSON object per line:
//!
//! ```json
//! {"collection":"attachments_semantic","text":"...","source":"report.pdf","offset":2,
//!  "metadata":{"filename":"report.pdf","page":3}}
//! ```
//!
//! `id`, `metadata`, `embedding`, `source` and `offset` are optional.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::record::CollectionKind;

/// One ingestion record as handed over by the ingestion collaborators.
#[derive(Clone, Debug, Deserialize)]
pub struct IngestRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub collection: CollectionKind,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Origin used to derive ids (message id, filename, ...).
    #[serde(default)]
    pub source: Option<String>,
    /// Position of the chunk inside its source.
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Reads all records from a JSONL file.
///
/// Empty lines are ignored; a malformed line fails with its 1-based number.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<IngestRecord>, StoreError> {
    info!("reading ingestion JSONL: {:?}", path.as_ref());
    let file = File::open(path.as_ref())?;
    parse_records(BufReader::new(file))
}

/// Parses records from any buffered reader.
pub fn parse_records(reader: impl BufRead) -> Result<Vec<IngestRecord>, StoreError> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let r: IngestRecord = serde_json::from_str(&line)
            .map_err(|source| StoreError::Parse { line: i + 1, source })?;
        out.push(r);
    }
    debug!(records = out.len(), "parsed ingestion records");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_rows_and_reports_bad_line() {
        let src = concat!(
            r#"{"collection":"mail_bodies","text":"hi","metadata":{"subject":"Q3"}}"#,
            "\n\n",
            r#"{"collection":"attachments_tabular_idx","text":"sheet","embedding":[0.5,0.5]}"#,
            "\n"
        );
        let rows = parse_records(src.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].collection, CollectionKind::MailBodies);
        assert_eq!(rows[1].embedding.as_deref(), Some(&[0.5f32, 0.5][..]));

        let bad = "{\"collection\":\"mail_bodies\",\"text\":\"ok\"}\n{\"collection\":\"inbox\"}\n";
        let err = parse_records(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Parse { line: 2, .. }));
    }
}
