//! In-memory rectangular table of typed cells.

use std::fmt;

use crate::format::fmt_number;

/// One scalar cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Infers a typed cell from raw text (CSV fields).
    ///
    /// Numbers may carry thousands separators (`1,250.5`); `NaN`/`inf`
    /// stay text.
    pub fn infer(raw: &str) -> Cell {
        let s = raw.trim();
        if s.is_empty() {
            return Cell::Empty;
        }
        if s.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        if s.chars().any(|c| c.is_ascii_digit())
            && s
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '+' | 'e' | 'E'))
        {
            if let Ok(n) = s.replace(',', "").parse::<f64>() {
                if n.is_finite() {
                    return Cell::Number(n);
                }
            }
        }
        Cell::Text(s.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Grouping key: rendered text, or `None` for empty cells.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            other => Some(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Empty => "empty",
            Cell::Bool(_) => "bool",
            Cell::Number(_) => "number",
            Cell::Text(_) => "text",
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(n) => f.write_str(&fmt_number(*n)),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Rectangular table: every row has exactly `columns.len()` cells.
#[derive(Clone, Debug, PartialEq)]
pub struct TabularDataset {
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TabularDataset {
    /// Builds a dataset, normalizing shape.
    ///
    /// Blank headers become `Unnamed: <i>`; short rows are padded with
    /// [`Cell::Empty`], long rows truncated; fully empty rows are dropped.
    pub fn new(label: impl Into<String>, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns: Vec<String> = header
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if h.is_empty() {
                    format!("Unnamed: {i}")
                } else {
                    h.to_string()
                }
            })
            .collect();
        let width = columns.len();

        let rows = rows
            .into_iter()
            .filter(|r| r.iter().any(|c| !c.is_empty()))
            .map(|mut r| {
                r.resize(width, Cell::Empty);
                r
            })
            .collect();

        Self {
            label: label.into(),
            columns,
            rows,
        }
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |r| r.get(idx))
    }

    /// Numeric values of a column (non-numeric cells skipped).
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column(idx).filter_map(Cell::as_f64).collect()
    }

    /// True when the column has at least one number and nothing but numbers
    /// besides empty cells.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut seen = false;
        for c in self.column(idx) {
            match c {
                Cell::Number(_) => seen = true,
                Cell::Empty => {}
                _ => return false,
            }
        }
        seen
    }

    /// Dominant non-empty cell type of a column (`empty` when all blank).
    pub fn column_type(&self, idx: usize) -> &'static str {
        if self.is_numeric_column(idx) {
            return "number";
        }
        let mut kinds = self.column(idx).filter(|c| !c.is_empty()).map(Cell::type_name);
        match kinds.next() {
            None => "empty",
            Some(first) if kinds.all(|k| k == first) => first,
            Some(_) => "mixed",
        }
    }

    /// First `n` rows rendered as an aligned text table (header included).
    pub fn render_head(&self, n: usize) -> String {
        let shown: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|r| r.iter().map(Cell::to_string).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, h)| {
                shown
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &mut dyn Iterator<Item = &str>| -> String {
            cells
                .zip(&widths)
                .map(|(c, w)| format!("{c:>w$}", w = *w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut out = line(&mut self.columns.iter().map(String::as_str));
        for r in &shown {
            out.push('\n');
            out.push_str(&line(&mut r.iter().map(String::as_str)));
        }
        out
    }

    /// Preview block: label, shape and the first `n` rows.
    pub fn preview(&self, label: &str, n: usize) -> String {
        let (rows, cols) = self.shape();
        format!(
            "{label} (shape: {rows} rows x {cols} columns):\n{}",
            self.render_head(n)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_types() {
        assert_eq!(Cell::infer(" 1,250.5 "), Cell::Number(1250.5));
        assert_eq!(Cell::infer("-3"), Cell::Number(-3.0));
        assert_eq!(Cell::infer("TRUE"), Cell::Bool(true));
        assert_eq!(Cell::infer("NaN"), Cell::Text("NaN".into()));
        assert_eq!(Cell::infer("2024-01-05"), Cell::Text("2024-01-05".into()));
        assert_eq!(Cell::infer("  "), Cell::Empty);
    }

    #[test]
    fn new_normalizes_shape_and_headers() {
        let ds = TabularDataset::new(
            "t",
            vec!["Region".into(), " ".into()],
            vec![
                vec![Cell::infer("Asia")],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::infer("EU"), Cell::infer("2"), Cell::infer("extra")],
            ],
        );
        assert_eq!(ds.columns, vec!["Region", "Unnamed: 1"]);
        assert_eq!(ds.shape(), (2, 2));
        assert_eq!(ds.rows[0][1], Cell::Empty);
        assert!(ds.is_numeric_column(1));
        assert_eq!(ds.column_type(0), "text");
    }

    #[test]
    fn render_head_aligns_columns() {
        let ds = TabularDataset::new(
            "t",
            vec!["A".into(), "Sales".into()],
            vec![vec![Cell::infer("North"), Cell::infer("100")]],
        );
        assert_eq!(ds.render_head(5), "    A  Sales\nNorth    100");
        assert!(ds.preview("t", 5).starts_with("t (shape: 1 rows x 2 columns):\n"));
    }
}
