//! Unified error type for the crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabularError>;

#[derive(Debug, Error)]
pub enum TabularError {
    /// Transport failure (connect/read timeout, DNS, reset).
    #[error("[Tabular] fetch failed for {locator}: {reason}")]
    Fetch { locator: String, reason: String },

    /// The blob endpoint answered with a non-2xx status.
    #[error("[Tabular] HTTP {status} for {locator}")]
    HttpStatus { locator: String, status: u16 },

    /// File extension is neither CSV nor XLSX/XLSM.
    #[error("[Tabular] unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("[Tabular] csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("[Tabular] xlsx error: {0}")]
    Excel(#[from] calamine::XlsxError),

    #[error("[Tabular] sheet not found: {0}")]
    SheetNotFound(String),

    #[error("[Tabular] workbook has no sheets")]
    EmptyWorkbook,

    #[error("[Tabular] config error: {0}")]
    Config(String),

    /// Model-driven analysis failed (timeout, provider error, empty output).
    #[error("[Tabular] generation failed: {0}")]
    Generation(#[from] llm_gateway::LlmError),
}
