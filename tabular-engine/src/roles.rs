//! Column role classification from header keywords.

use serde::Serialize;

use crate::dataset::TabularDataset;

/// What a column is about, as far as the rule-based analysis cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Region,
    Country,
    Sales,
    Item,
    Unknown,
}

const REGION_WORDS: &[&str] = &["region", "continent", "area", "zone"];
const COUNTRY_WORDS: &[&str] = &["country", "countries", "nation", "state"];
const SALES_WORDS: &[&str] = &["sales", "revenue", "amount", "value"];
const ITEM_WORDS: &[&str] = &["item", "product", "type"];

impl ColumnRole {
    /// Keyword family of the role (empty for `Unknown`).
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Region => REGION_WORDS,
            ColumnRole::Country => COUNTRY_WORDS,
            ColumnRole::Sales => SALES_WORDS,
            ColumnRole::Item => ITEM_WORDS,
            ColumnRole::Unknown => &[],
        }
    }

    /// Grouping family a free word belongs to. Sales is never a grouping key.
    pub fn grouping_family(word: &str) -> Option<ColumnRole> {
        let w = word.to_lowercase();
        [ColumnRole::Region, ColumnRole::Country, ColumnRole::Item]
            .into_iter()
            .find(|r| r.keywords().iter().any(|k| w.contains(k)))
    }

    /// Role of a column from its header. Precedence:
    /// Region > Country > Sales (numeric only) > Item.
    pub fn classify(name: &str, numeric: bool) -> ColumnRole {
        let n = name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| n.contains(w));
        if has(REGION_WORDS) {
            ColumnRole::Region
        } else if has(COUNTRY_WORDS) {
            ColumnRole::Country
        } else if numeric && has(SALES_WORDS) {
            ColumnRole::Sales
        } else if has(ITEM_WORDS) {
            ColumnRole::Item
        } else {
            ColumnRole::Unknown
        }
    }
}

/// Roles of every column of one dataset, computed once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRoles {
    roles: Vec<ColumnRole>,
    numeric: Vec<bool>,
}

impl ColumnRoles {
    pub fn detect(ds: &TabularDataset) -> Self {
        let numeric: Vec<bool> = (0..ds.columns.len())
            .map(|i| ds.is_numeric_column(i))
            .collect();
        let roles = ds
            .columns
            .iter()
            .zip(&numeric)
            .map(|(name, &num)| ColumnRole::classify(name, num))
            .collect();
        Self { roles, numeric }
    }

    pub fn role(&self, idx: usize) -> ColumnRole {
        self.roles.get(idx).copied().unwrap_or(ColumnRole::Unknown)
    }

    /// Leftmost column with `role`.
    pub fn first(&self, role: ColumnRole) -> Option<usize> {
        self.roles.iter().position(|r| *r == role)
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.first(role).is_some()
    }

    pub fn is_numeric(&self, idx: usize) -> bool {
        self.numeric.get(idx).copied().unwrap_or(false)
    }

    /// Indices of numeric columns, left to right.
    pub fn numeric_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.numeric
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.then_some(i))
    }
}
