//! Rule-based analysis: pure functions over (dataset, roles, signals).
//!
//! [`DISPATCH`] is tried in order; the first strategy that applies and
//! produces output answers for the table. A strategy that cannot run
//! (missing column, no numeric data) yields `None` and the next one is tried.

use crate::dataset::{Cell, TabularDataset};
use crate::format::fmt_number;
use crate::roles::{ColumnRole, ColumnRoles};
use crate::signals::{QuestionSignals, term_variants};
use crate::stats::{Aggregation, distinct_where, group_aggregate, summarize, value_counts};

const LIST_LIMIT: usize = 10;
const OVERVIEW_COLUMNS: usize = 5;
const OVERVIEW_CATEGORICAL_MAX_UNIQUE: usize = 20;

/// Inputs shared by every strategy for one table.
pub struct StrategyInput<'a> {
    pub ds: &'a TabularDataset,
    pub roles: &'a ColumnRoles,
    pub signals: &'a QuestionSignals,
    /// Groups listed by aggregate strategies.
    pub top_n: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    FilteredDistinctCount,
    GroupByAggregate,
    ValueSummary,
    DistinctCount,
    RegionalBreakdown,
    ItemBreakdown,
    NumericStats,
    Overview,
}

pub const DISPATCH: [Strategy; 8] = [
    Strategy::FilteredDistinctCount,
    Strategy::GroupByAggregate,
    Strategy::ValueSummary,
    Strategy::DistinctCount,
    Strategy::RegionalBreakdown,
    Strategy::ItemBreakdown,
    Strategy::NumericStats,
    Strategy::Overview,
];

impl Strategy {
    /// Whether the roles and signals call for this strategy at all.
    pub fn applies(self, input: &StrategyInput<'_>) -> bool {
        let (r, s) = (input.roles, input.signals);
        match self {
            Strategy::FilteredDistinctCount => {
                s.count
                    && r.has(ColumnRole::Region)
                    && r.has(ColumnRole::Country)
                    && !s.filter_terms.is_empty()
            }
            Strategy::GroupByAggregate => {
                s.aggregate && r.has(ColumnRole::Sales) && s.grouping().is_some()
            }
            Strategy::ValueSummary => s.aggregate && r.has(ColumnRole::Sales),
            Strategy::DistinctCount => s.count && r.has(ColumnRole::Country),
            Strategy::RegionalBreakdown => s.region_word && r.has(ColumnRole::Region),
            Strategy::ItemBreakdown => s.item_word && r.has(ColumnRole::Item),
            Strategy::NumericStats => {
                s.stats && !r.has(ColumnRole::Sales) && r.numeric_columns().next().is_some()
            }
            Strategy::Overview => true,
        }
    }

    pub fn run(self, input: &StrategyInput<'_>) -> Option<String> {
        match self {
            Strategy::FilteredDistinctCount => filtered_distinct_count(input),
            Strategy::GroupByAggregate => group_by_aggregate(input),
            Strategy::ValueSummary => value_summary(input),
            Strategy::DistinctCount => distinct_count(input),
            Strategy::RegionalBreakdown => regional_breakdown(input),
            Strategy::ItemBreakdown => item_breakdown(input),
            Strategy::NumericStats => numeric_stats(input),
            Strategy::Overview => Some(overview(input)),
        }
    }
}

/// Answer for one table, or the empty-sheet notice when it has no rows.
pub fn analyze_table(input: &StrategyInput<'_>) -> (Option<Strategy>, String) {
    if input.ds.is_empty() {
        return (None, empty_sheet(input.ds));
    }
    for strategy in DISPATCH {
        if !strategy.applies(input) {
            continue;
        }
        if let Some(text) = strategy.run(input) {
            return (Some(strategy), text);
        }
    }
    (Some(Strategy::Overview), overview(input))
}

pub(crate) fn empty_sheet(ds: &TabularDataset) -> String {
    format!(
        "Data status: empty sheet with {} columns defined but no data rows.\nColumns available: {}",
        ds.columns.len(),
        ds.columns.join(", ")
    )
}

fn list_with_more(items: &[String], limit: usize) -> String {
    let mut out = items
        .iter()
        .take(limit)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > limit {
        out.push_str(&format!(" (and {} more)", items.len() - limit));
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(f) => f.to_uppercase().chain(c).collect(),
        None => String::new(),
    }
}

fn text_contains(cell: &Cell, needle: &str) -> bool {
    match cell {
        Cell::Text(t) => t.to_lowercase().contains(needle),
        _ => false,
    }
}

fn filtered_distinct_count(input: &StrategyInput<'_>) -> Option<String> {
    let region = input.roles.first(ColumnRole::Region)?;
    let country = input.roles.first(ColumnRole::Country)?;

    // First question term that occurs in some region value.
    let needle = input
        .signals
        .filter_terms
        .iter()
        .flat_map(|t| term_variants(t))
        .find(|v| input.ds.column(region).any(|c| text_contains(c, v)))?;

    let countries = distinct_where(input.ds, country, |row| {
        row.get(region).is_some_and(|c| text_contains(c, &needle))
    });
    let name = capitalize(&needle);
    Some(format!(
        "**{name} Region Analysis:**\n- Number of countries in {name}: **{}**\n- Countries: {}",
        countries.len(),
        list_with_more(&countries, LIST_LIMIT)
    ))
}

fn render_groups(groups: &[(String, f64)], top_n: usize) -> String {
    let mut lines: Vec<String> = groups
        .iter()
        .take(top_n)
        .map(|(k, v)| format!("- {k}: {}", fmt_number(*v)))
        .collect();
    if groups.len() > top_n {
        lines.push(format!("- ... and {} more groups", groups.len() - top_n));
    }
    lines.join("\n")
}

fn group_by_aggregate(input: &StrategyInput<'_>) -> Option<String> {
    let sales = input.roles.first(ColumnRole::Sales)?;
    let group = input.roles.first(input.signals.grouping()?)?;
    let agg = if input.signals.average {
        Aggregation::Mean
    } else {
        Aggregation::Sum
    };
    let groups = group_aggregate(input.ds, group, sales, agg);
    if groups.is_empty() {
        return None;
    }
    Some(format!(
        "**{} by {} ({}):**\n{}",
        input.ds.columns[sales],
        input.ds.columns[group],
        agg.label(),
        render_groups(&groups, input.top_n)
    ))
}

fn value_summary(input: &StrategyInput<'_>) -> Option<String> {
    let sales = input.roles.first(ColumnRole::Sales)?;
    let s = summarize(&input.ds.numeric_values(sales))?;
    let col = &input.ds.columns[sales];
    Some(format!(
        "**Financial Summary:**\n- Total {col}: {}\n- Average {col}: {}",
        fmt_number(s.sum),
        fmt_number(s.mean)
    ))
}

fn distinct_count(input: &StrategyInput<'_>) -> Option<String> {
    let country = input.roles.first(ColumnRole::Country)?;
    let values = distinct_where(input.ds, country, |_| true);
    if values.is_empty() {
        return None;
    }
    Some(format!(
        "**Count Analysis:**\n- Total unique {}: **{}**\n- Values: {}",
        input.ds.columns[country],
        values.len(),
        list_with_more(&values, LIST_LIMIT)
    ))
}

fn regional_breakdown(input: &StrategyInput<'_>) -> Option<String> {
    let region = input.roles.first(ColumnRole::Region)?;
    let counts = value_counts(input.ds, region);
    if counts.is_empty() {
        return None;
    }
    let names: Vec<String> = counts.iter().map(|(k, _)| k.clone()).collect();
    let mut out = format!(
        "**Regional Analysis:**\n- Regions found: {}",
        list_with_more(&names, OVERVIEW_COLUMNS)
    );

    if let Some(country) = input.roles.first(ColumnRole::Country) {
        let per: Vec<String> = names
            .iter()
            .map(|name| {
                let n = distinct_where(input.ds, country, |row| {
                    row.get(region).and_then(Cell::key).as_deref() == Some(name.as_str())
                })
                .len();
                format!("{name}: {n}")
            })
            .collect();
        out.push_str(&format!("\n- Countries per region: {}", per.join(", ")));
    }

    if let Some(sales) = input.roles.first(ColumnRole::Sales) {
        let groups = group_aggregate(input.ds, region, sales, Aggregation::Sum);
        if !groups.is_empty() {
            let rendered: Vec<String> = groups
                .iter()
                .map(|(k, v)| format!("{k}: {}", fmt_number(*v)))
                .collect();
            out.push_str(&format!(
                "\n- {} by region: {}",
                input.ds.columns[sales],
                rendered.join(", ")
            ));
        }
    }
    Some(out)
}

fn item_breakdown(input: &StrategyInput<'_>) -> Option<String> {
    let item = input.roles.first(ColumnRole::Item)?;
    let counts = value_counts(input.ds, item);
    if counts.is_empty() {
        return None;
    }
    let frequent: Vec<String> = counts
        .iter()
        .take(input.top_n)
        .map(|(k, n)| format!("{k} ({n})"))
        .collect();
    let mut out = format!(
        "**Product/Item Analysis:**\n- Unique items: **{}**\n- Total records: {}\n- Most frequent: {}",
        counts.len(),
        input.ds.rows.len(),
        frequent.join(", ")
    );

    if let Some(sales) = input.roles.first(ColumnRole::Sales) {
        let groups = group_aggregate(input.ds, item, sales, Aggregation::Sum);
        if !groups.is_empty() {
            out.push_str(&format!(
                "\n- Top items by {}:\n{}",
                input.ds.columns[sales],
                render_groups(&groups, input.top_n)
            ));
        }
    }
    Some(out)
}

fn numeric_stats(input: &StrategyInput<'_>) -> Option<String> {
    let lines: Vec<String> = input
        .roles
        .numeric_columns()
        .filter_map(|i| {
            let s = summarize(&input.ds.numeric_values(i))?;
            Some(format!(
                "- **{}:** total {}, average {}, min {}, max {}",
                input.ds.columns[i],
                fmt_number(s.sum),
                fmt_number(s.mean),
                fmt_number(s.min),
                fmt_number(s.max)
            ))
        })
        .take(3)
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(format!("**Numeric Summary:**\n{}", lines.join("\n")))
}

fn overview(input: &StrategyInput<'_>) -> String {
    let ds = input.ds;
    let (rows, cols) = ds.shape();
    let mut out = format!(
        "**Dataset Overview:**\n- Shape: {rows} rows, {cols} columns\n- Columns: {}",
        list_with_more(&ds.columns, OVERVIEW_COLUMNS)
    );

    let mut details = Vec::new();
    for (i, name) in ds.columns.iter().enumerate().take(OVERVIEW_COLUMNS) {
        if input.roles.is_numeric(i) {
            if let Some(s) = summarize(&ds.numeric_values(i)) {
                details.push(format!(
                    "- **{name}:** range {} to {}, average {}",
                    fmt_number(s.min),
                    fmt_number(s.max),
                    fmt_number(s.mean)
                ));
            }
            continue;
        }
        let counts = value_counts(ds, i);
        if counts.is_empty() {
            continue;
        }
        if counts.len() <= OVERVIEW_CATEGORICAL_MAX_UNIQUE {
            let top: Vec<&str> = counts.iter().take(5).map(|(k, _)| k.as_str()).collect();
            details.push(format!(
                "- **{name}:** {} unique ({})",
                counts.len(),
                top.join(", ")
            ));
        } else {
            details.push(format!("- **{name}:** {} unique values", counts.len()));
        }
    }
    if !details.is_empty() {
        out.push('\n');
        out.push_str(&details.join("\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[&[&str]]) -> TabularDataset {
        TabularDataset::new(
            "t",
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::infer(c)).collect())
                .collect(),
        )
    }

    fn run(ds: &TabularDataset, question: &str) -> (Option<Strategy>, String) {
        let roles = ColumnRoles::detect(ds);
        let signals = QuestionSignals::extract(question);
        analyze_table(&StrategyInput {
            ds,
            roles: &roles,
            signals: &signals,
            top_n: 5,
        })
    }

    #[test]
    fn asia_country_count() {
        let ds = table(
            &["Region", "Country"],
            &[&["Asia", "India"], &["Asia", "China"], &["Europe", "Germany"]],
        );
        let (strategy, text) = run(&ds, "how many countries are in Asia?");
        assert_eq!(strategy, Some(Strategy::FilteredDistinctCount));
        assert!(text.contains("Number of countries in Asia: **2**"), "{text}");
        assert!(text.contains("Countries: India, China"), "{text}");
        assert!(!text.contains("Germany"));
    }

    #[test]
    fn adjective_form_matches_region_values() {
        let ds = table(
            &["Continent", "Nation"],
            &[&["South Asia", "India"], &["Europe", "France"]],
        );
        let (_, text) = run(&ds, "number of Asian nations");
        assert!(text.contains("Number of countries in Asia: **1**"), "{text}");
    }

    #[test]
    fn european_and_african_resolve_to_their_regions() {
        let ds = table(
            &["Region", "Country"],
            &[
                &["Europe", "Germany"],
                &["Europe", "France"],
                &["Africa", "Kenya"],
                &["Asia", "India"],
            ],
        );
        let (strategy, text) = run(&ds, "how many European countries are there?");
        assert_eq!(strategy, Some(Strategy::FilteredDistinctCount));
        assert!(text.contains("Number of countries in Europe: **2**"), "{text}");

        let (_, text) = run(&ds, "how many African countries");
        assert!(text.contains("Number of countries in Africa: **1**"), "{text}");
    }

    #[test]
    fn unmatched_filter_falls_through_to_distinct_count() {
        let ds = table(
            &["Region", "Country"],
            &[&["Asia", "India"], &["Europe", "Germany"]],
        );
        let (strategy, text) = run(&ds, "how many countries in Africa");
        assert_eq!(strategy, Some(Strategy::DistinctCount));
        assert!(text.contains("Total unique Country: **2**"), "{text}");
    }

    #[test]
    fn total_sales_by_region_sorted_descending() {
        let ds = table(
            &["Region", "Sales"],
            &[&["North", "100"], &["South", "200"], &["North", "50"]],
        );
        let (strategy, text) = run(&ds, "total sales by region");
        assert_eq!(strategy, Some(Strategy::GroupByAggregate));
        let south = text.find("South: 200").expect("south");
        let north = text.find("North: 150").expect("north");
        assert!(south < north, "{text}");
    }

    #[test]
    fn average_without_grouping_is_a_value_summary() {
        let ds = table(&["Item", "Revenue"], &[&["Pen", "10"], &["Ink", "20"]]);
        let (strategy, text) = run(&ds, "what is the average revenue?");
        assert_eq!(strategy, Some(Strategy::ValueSummary));
        assert!(text.contains("Total Revenue: 30"));
        assert!(text.contains("Average Revenue: 15"));
    }

    #[test]
    fn item_breakdown_lists_frequencies() {
        let ds = table(&["Product", "Qty"], &[&["Pen", "1"], &["Pen", "2"], &["Ink", "3"]]);
        let (strategy, text) = run(&ds, "which products appear most?");
        assert_eq!(strategy, Some(Strategy::ItemBreakdown));
        assert!(text.contains("Pen (2), Ink (1)"), "{text}");
    }

    #[test]
    fn numeric_stats_without_sales_column() {
        let ds = table(&["Name", "Score"], &[&["a", "1"], &["b", "3"]]);
        let (strategy, text) = run(&ds, "what is the max score");
        assert_eq!(strategy, Some(Strategy::NumericStats));
        assert!(text.contains("min 1, max 3"), "{text}");
    }

    #[test]
    fn nothing_matched_gives_overview() {
        let ds = table(&["Name", "Score"], &[&["a", "1"], &["b", "3"]]);
        let (strategy, text) = run(&ds, "tell me about this");
        assert_eq!(strategy, Some(Strategy::Overview));
        assert!(text.contains("Shape: 2 rows, 2 columns"));
        assert!(text.contains("**Score:** range 1 to 3, average 2"), "{text}");
        assert!(text.contains("**Name:** 2 unique (a, b)"), "{text}");
    }

    #[test]
    fn empty_table_runs_no_strategy() {
        let ds = table(&["Region", "Sales"], &[]);
        let (strategy, text) = run(&ds, "total sales by region");
        assert_eq!(strategy, None);
        assert!(text.contains("empty sheet with 2 columns"));
        assert!(text.contains("Region, Sales"));
    }
}
