//! Core data models used by the library.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StoreError;

/// Scalar metadata value: string or integer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
}

impl MetaValue {
    /// Lenient conversion from arbitrary JSON.
    ///
    /// Integers stay integers, every other scalar becomes text, nested values
    /// are kept as compact JSON text and `null` is dropped.
    pub fn from_json(v: &Value) -> Option<MetaValue> {
        match v {
            Value::Null => None,
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => MetaValue::Int(i),
                None => MetaValue::Text(n.to_string()),
            }),
            Value::String(s) => Some(MetaValue::Text(s.clone())),
            Value::Bool(b) => Some(MetaValue::Text(b.to_string())),
            other => Some(MetaValue::Text(other.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::Int(_) => None,
        }
    }

    /// Integer value, also accepting numeric text such as `"3"`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            MetaValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(i) => write!(f, "{i}"),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Int(i)
    }
}

/// Ordered chunk metadata.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Metadata key of the chunk kind discriminator.
pub const TYPE_KEY: &str = "type";

/// Text of a metadata field, ignoring blanks.
pub fn meta_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(MetaValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The three disjoint collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    MailBodies,
    AttachmentsSemantic,
    AttachmentsTabularIdx,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::MailBodies,
        CollectionKind::AttachmentsSemantic,
        CollectionKind::AttachmentsTabularIdx,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::MailBodies => "mail_bodies",
            CollectionKind::AttachmentsSemantic => "attachments_semantic",
            CollectionKind::AttachmentsTabularIdx => "attachments_tabular_idx",
        }
    }

    /// Default `type` discriminator for chunks of this collection.
    pub fn type_tag(&self) -> &'static str {
        match self {
            CollectionKind::MailBodies => "mail_body",
            CollectionKind::AttachmentsSemantic => "attachment_pdf",
            CollectionKind::AttachmentsTabularIdx => "attachment_tabular",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|k| k.name() == s.trim())
            .ok_or_else(|| StoreError::UnknownCollection(s.to_string()))
    }
}

/// A retrievable unit: text, its embedding and citation metadata.
///
/// Chunks are immutable once inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// Exact-match filter over metadata; every pair must match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RagFilter {
    pub equals: Vec<(String, MetaValue)>,
}

impl RagFilter {
    pub fn field_eq(key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        Self {
            equals: vec![(key.into(), value.into())],
        }
    }
}

/// Query parameters for retrieval.
#[derive(Clone, Debug)]
pub struct RagQuery<'a> {
    pub text: &'a str,
    pub top_k: usize,
    pub filter: Option<RagFilter>,
}

/// A single retrieval hit.
#[derive(Clone, Debug, PartialEq)]
pub struct RagHit {
    pub score: f32,
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

/// Clamps a snippet to `max_chars` characters and `max_lines` lines,
/// appending `…` when something was cut.
pub fn clamp_snippet(s: &str, max_chars: usize, max_lines: usize) -> String {
    let mut out = String::new();
    let mut cut = false;
    for (i, line) in s.lines().enumerate() {
        if i >= max_lines {
            cut = true;
            break;
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line);
    }
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
        cut = true;
    }
    if cut {
        out.push('…');
    }
    out
}
