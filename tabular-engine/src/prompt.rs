//! Tier A prompt: a compact data brief per table plus the question.

use std::fmt::Write as _;

use crate::config::ReasonerConfig;
use crate::format::fmt_number;
use crate::loader::LabeledTable;
use crate::stats::{summarize, value_counts};

const INSTRUCTIONS: &str = "\
You are a careful data analyst. Answer the user's question using ONLY the tables below.
Rules:
1. Compute every number from the data shown; never invent values.
2. When the sample is not enough to be exact, say so and state what you computed from.
3. Name the table (and sheet) each figure comes from.
4. Start with a direct answer, then list the supporting figures.";

/// Data brief of one table: shape, columns, dtypes, sample rows, numeric
/// statistics and top categorical values.
pub fn describe_table(t: &LabeledTable, cfg: &ReasonerConfig) -> String {
    let ds = &t.dataset;
    let (rows, cols) = ds.shape();
    let mut out = String::new();

    let _ = writeln!(out, "TABLE: {}", t.label);
    let _ = writeln!(out, "Shape: {rows} rows, {cols} columns");
    let _ = writeln!(out, "Columns: {}", ds.columns.join(", "));
    let dtypes: Vec<String> = ds
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{c}: {}", ds.column_type(i)))
        .collect();
    let _ = writeln!(out, "Data types: {}", dtypes.join(", "));
    if ds.is_empty() {
        let _ = writeln!(out, "Data status: empty sheet, no data rows.");
        return out;
    }

    let _ = writeln!(out, "\nSAMPLE DATA (first {} rows):", cfg.sample_rows.min(rows));
    let _ = writeln!(out, "{}", ds.render_head(cfg.sample_rows));

    let numeric: Vec<String> = (0..cols)
        .filter(|&i| ds.is_numeric_column(i))
        .filter_map(|i| {
            let s = summarize(&ds.numeric_values(i))?;
            Some(format!(
                "- {}: count {}, min {}, max {}, mean {}",
                ds.columns[i],
                s.count,
                fmt_number(s.min),
                fmt_number(s.max),
                fmt_number(s.mean)
            ))
        })
        .collect();
    if !numeric.is_empty() {
        let _ = writeln!(out, "\nNUMERIC STATISTICS:\n{}", numeric.join("\n"));
    }

    let categorical: Vec<String> = (0..cols)
        .filter(|&i| !ds.is_numeric_column(i))
        .map(|i| (i, value_counts(ds, i)))
        .filter(|(_, counts)| !counts.is_empty())
        .take(cfg.max_categorical_columns)
        .map(|(i, counts)| {
            let top: Vec<String> = counts
                .iter()
                .take(cfg.categorical_top)
                .map(|(v, n)| format!("{v} ({n})"))
                .collect();
            format!("- {}: {}", ds.columns[i], top.join(", "))
        })
        .collect();
    if !categorical.is_empty() {
        let _ = writeln!(out, "\nCATEGORICAL DATA (top values):\n{}", categorical.join("\n"));
    }
    out
}

pub fn build_prompt(question: &str, tables: &[LabeledTable], cfg: &ReasonerConfig) -> String {
    let briefs: Vec<String> = tables.iter().map(|t| describe_table(t, cfg)).collect();
    format!(
        "{INSTRUCTIONS}\n\nTABULAR DATA:\n\n{}\nUSER QUESTION: {}\n\nANSWER:",
        briefs.join("\n"),
        question.trim()
    )
}
