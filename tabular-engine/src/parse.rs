//! Bytes → [`TabularDataset`] by file extension.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use tracing::debug;

use crate::dataset::{Cell, TabularDataset};
use crate::errors::TabularError;

/// Supported source formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Detects the format from a filename extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, TabularError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" => Ok(SourceFormat::Xlsx),
            _ => Err(TabularError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Parses `bytes` of `filename`; for workbooks `sheet` picks the sheet
/// (first sheet when `None`).
pub fn parse_dataset(
    label: &str,
    filename: &str,
    sheet: Option<&str>,
    bytes: &[u8],
) -> Result<TabularDataset, TabularError> {
    let ds = match SourceFormat::from_filename(filename)? {
        SourceFormat::Csv => parse_csv(label, bytes)?,
        SourceFormat::Xlsx => parse_xlsx(label, sheet, bytes)?,
    };
    debug!(label, rows = ds.rows.len(), cols = ds.columns.len(), "parsed dataset");
    Ok(ds)
}

fn parse_csv(label: &str, bytes: &[u8]) -> Result<TabularDataset, TabularError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        rows.push(rec.iter().map(Cell::infer).collect());
    }
    Ok(TabularDataset::new(label, header, rows))
}

fn parse_xlsx(label: &str, sheet: Option<&str>, bytes: &[u8]) -> Result<TabularDataset, TabularError> {
    let mut wb: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let names = wb.sheet_names();
    let name = match sheet {
        Some(s) => names
            .iter()
            .find(|n| n.as_str() == s)
            .cloned()
            .ok_or_else(|| TabularError::SheetNotFound(s.to_string()))?,
        None => names.first().cloned().ok_or(TabularError::EmptyWorkbook)?,
    };

    let range = wb.worksheet_range(&name)?;
    let mut it = range.rows();
    let header: Vec<String> = it
        .next()
        .map(|r| r.iter().map(|d| cell_from_data(d).to_string()).collect())
        .unwrap_or_default();
    let rows = it.map(|r| r.iter().map(cell_from_data).collect()).collect();

    Ok(TabularDataset::new(label, header, rows))
}

fn cell_from_data(d: &Data) -> Cell {
    match d {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.trim().to_string()),
        other => Cell::Text(other.to_string()),
    }
}
