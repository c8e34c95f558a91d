//! Metadata equality filters.
//!
//! Integer and text values compare across representations, so a filter on
//! `page = 3` matches both `3` and `"3"`.

use crate::record::{MetaValue, Metadata, RagFilter};

/// True when every `(key, value)` pair of the filter matches `metadata`.
pub fn matches(filter: &RagFilter, metadata: &Metadata) -> bool {
    filter
        .equals
        .iter()
        .all(|(k, want)| metadata.get(k).is_some_and(|got| value_eq(got, want)))
}

fn value_eq(got: &MetaValue, want: &MetaValue) -> bool {
    if got == want {
        return true;
    }
    match (got.as_int(), want.as_int()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Metadata {
        let mut m = Metadata::new();
        m.insert("type".into(), "attachment_pdf".into());
        m.insert("page".into(), MetaValue::Int(3));
        m
    }

    #[test]
    fn all_pairs_must_match() {
        let f = RagFilter {
            equals: vec![
                ("type".into(), "attachment_pdf".into()),
                ("page".into(), "3".into()),
            ],
        };
        assert!(matches(&f, &meta()));

        let f = RagFilter {
            equals: vec![
                ("type".into(), "attachment_pdf".into()),
                ("filename".into(), "a.pdf".into()),
            ],
        };
        assert!(!matches(&f, &meta()));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(&RagFilter::default(), &Metadata::new()));
    }
}
