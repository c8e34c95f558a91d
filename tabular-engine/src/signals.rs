//! Keyword signals extracted once from the question.

use crate::roles::ColumnRole;

const COUNT_WORDS: &[&str] = &["count", "number", "many"];
const AGGREGATE_WORDS: &[&str] = &[
    "total", "sum", "average", "avg", "mean", "aggregate", "sales", "revenue",
];
const AVERAGE_WORDS: &[&str] = &["average", "avg", "mean"];
const STATS_WORDS: &[&str] = &[
    "sum", "total", "average", "avg", "mean", "max", "maximum", "min", "minimum", "highest", "lowest",
];
const REGION_WORDS: &[&str] = &["region", "regions", "regional"];
const ITEM_WORDS: &[&str] = &["item", "items", "product", "products", "type", "types"];

/// Words never used as value filters.
const STOPWORDS: &[&str] = &[
    "how", "many", "are", "the", "and", "for", "with", "what", "which", "there", "does", "number",
    "count", "total", "sum", "list", "show", "have", "has", "been", "from", "that", "this", "all",
    "each", "per", "into", "their", "its", "was", "were", "can", "you", "please", "give", "tell",
    "about", "data", "table", "sheet", "average", "mean", "sales", "revenue",
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionSignals {
    /// Lowercased alphanumeric tokens.
    pub tokens: Vec<String>,
    pub count: bool,
    pub aggregate: bool,
    pub average: bool,
    pub stats: bool,
    pub region_word: bool,
    pub item_word: bool,
    /// Family named by "by <word>" / "per <word>".
    pub group_by: Option<ColumnRole>,
    /// Candidate value filters (e.g. `asia`), in question order.
    pub filter_terms: Vec<String>,
}

impl QuestionSignals {
    pub fn extract(question: &str) -> Self {
        let tokens: Vec<String> = question
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let any = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));

        let group_by = tokens
            .windows(2)
            .find(|w| w[0] == "by" || w[0] == "per")
            .and_then(|w| ColumnRole::grouping_family(&w[1]));

        let filter_terms = tokens
            .iter()
            .filter(|t| t.chars().count() >= 3)
            .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .filter(|t| ColumnRole::grouping_family(t).is_none())
            .cloned()
            .collect();

        Self {
            count: any(COUNT_WORDS),
            aggregate: any(AGGREGATE_WORDS),
            average: any(AVERAGE_WORDS),
            stats: any(STATS_WORDS),
            region_word: any(REGION_WORDS),
            item_word: any(ITEM_WORDS),
            group_by,
            filter_terms,
            tokens,
        }
    }

    /// Grouping family: explicit "by/per" first, else the region word.
    pub fn grouping(&self) -> Option<ColumnRole> {
        self.group_by
            .or_else(|| self.region_word.then_some(ColumnRole::Region))
    }
}

/// Variants a term may appear as inside cell values, longest first
/// (`asian` also tries `asia`, `european` also tries `europe`).
pub(crate) fn term_variants(term: &str) -> Vec<String> {
    let mut out = vec![term.to_string()];
    for suffix in ["n", "an"] {
        if let Some(stem) = term.strip_suffix(suffix) {
            if stem.chars().count() >= 3 {
                out.push(stem.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_question_with_region_filter() {
        let s = QuestionSignals::extract("How many countries are in Asia?");
        assert!(s.count);
        assert!(!s.aggregate);
        assert_eq!(s.filter_terms, vec!["asia"]);
        assert_eq!(s.grouping(), None);
    }

    #[test]
    fn total_by_region() {
        let s = QuestionSignals::extract("total sales by region");
        assert!(s.aggregate && !s.average);
        assert_eq!(s.group_by, Some(ColumnRole::Region));
        assert_eq!(s.grouping(), Some(ColumnRole::Region));
    }

    #[test]
    fn average_per_product() {
        let s = QuestionSignals::extract("What's the average revenue per product?");
        assert!(s.aggregate && s.average);
        assert!(s.item_word);
        assert_eq!(s.group_by, Some(ColumnRole::Item));
    }

    #[test]
    fn region_word_implies_grouping() {
        let s = QuestionSignals::extract("revenue for each region");
        assert_eq!(s.group_by, None);
        assert_eq!(s.grouping(), Some(ColumnRole::Region));
    }

    #[test]
    fn variants_strip_adjective_suffix() {
        assert_eq!(term_variants("asian"), vec!["asian", "asia"]);
        assert_eq!(term_variants("african"), vec!["african", "africa", "afric"]);
        assert_eq!(term_variants("european"), vec!["european", "europea", "europe"]);
        assert_eq!(term_variants("india"), vec!["india"]);
    }
}
