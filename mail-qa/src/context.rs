//! Shaping retrieval hits into prompt contexts, citations and table specs.

use std::fmt;

use mail_store::record::meta_str;
use mail_store::{Metadata, RagHit};
use serde::Serialize;
use tabular_engine::TableSpec;

pub const KEY_FILENAME: &str = "filename";
pub const KEY_SUBJECT: &str = "subject";
pub const KEY_SENDER: &str = "sender";
pub const KEY_PAGE: &str = "page";
pub const KEY_SHEET: &str = "sheet";
pub const KEY_BLOB_URI: &str = "blob_uri";

/// Where inside a source a context came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationHint {
    Page(i64),
    Sheet(String),
}

impl LocationHint {
    /// Built only from the chunk's own metadata: a `page` number first, then
    /// a non-empty `sheet`.
    pub fn from_metadata(m: &Metadata) -> Option<Self> {
        if let Some(page) = m.get(KEY_PAGE).and_then(|v| v.as_int()) {
            return Some(LocationHint::Page(page));
        }
        meta_str(m, KEY_SHEET).map(|s| LocationHint::Sheet(s.to_string()))
    }
}

impl fmt::Display for LocationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationHint::Page(p) => write!(f, "page {p}"),
            LocationHint::Sheet(s) => write!(f, "sheet {s}"),
        }
    }
}

/// One numbered block of the grounded prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextBlock {
    pub text: String,
    pub source_label: String,
    pub location: Option<LocationHint>,
}

impl ContextBlock {
    pub fn from_hit(hit: &RagHit) -> Self {
        Self {
            text: hit.text.clone(),
            source_label: source_label(&hit.metadata),
            location: LocationHint::from_metadata(&hit.metadata),
        }
    }
}

/// `filename`, else `subject`, else `source`.
pub fn source_label(m: &Metadata) -> String {
    meta_str(m, KEY_FILENAME)
        .or_else(|| meta_str(m, KEY_SUBJECT))
        .unwrap_or("source")
        .to_string()
}

/// Locator of a tabular index hit. Missing fields become empty strings; the
/// loader skips specs without a locator.
pub fn table_spec_from_hit(hit: &RagHit) -> TableSpec {
    let m = &hit.metadata;
    TableSpec::new(
        meta_str(m, KEY_BLOB_URI).unwrap_or_default(),
        meta_str(m, KEY_FILENAME).unwrap_or_default(),
        meta_str(m, KEY_SHEET).map(str::to_string),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_store::MetaValue;

    fn hit(meta: &[(&str, MetaValue)]) -> RagHit {
        RagHit {
            score: 0.9,
            id: "x".into(),
            text: "body".into(),
            metadata: meta.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }

    #[test]
    fn page_wins_over_sheet_and_text_pages_parse() {
        let h = hit(&[("page", "4".into()), ("sheet", "Q1".into())]);
        assert_eq!(ContextBlock::from_hit(&h).location, Some(LocationHint::Page(4)));
    }

    #[test]
    fn blank_sheet_is_no_location() {
        let h = hit(&[("filename", "a.xlsx".into()), ("sheet", "".into())]);
        let b = ContextBlock::from_hit(&h);
        assert_eq!(b.location, None);
        assert_eq!(b.source_label, "a.xlsx");
    }

    #[test]
    fn labels_fall_back_to_subject_then_source() {
        assert_eq!(source_label(&hit(&[("subject", "Q3 plan".into())]).metadata), "Q3 plan");
        assert_eq!(source_label(&hit(&[]).metadata), "source");
    }

    #[test]
    fn table_spec_from_index_hit() {
        let h = hit(&[
            ("blob_uri", "https://blobs/x.xlsx?sig=1".into()),
            ("filename", "x.xlsx".into()),
            ("sheet", "".into()),
        ]);
        let spec = table_spec_from_hit(&h);
        assert_eq!(spec.locator, "https://blobs/x.xlsx?sig=1");
        assert_eq!(spec.sheet, None);
        assert_eq!(spec.label(), "x.xlsx");
    }
}
