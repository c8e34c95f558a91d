//! Tabular attachments: loading and analysis.
//!
//! - [`TabularLoader`] re-materializes CSV/XLSX attachments from their
//!   locators (HTTP fetch, byte + dataset cache, parsing), keeping input order
//!   and omitting entries that fail.
//! - [`TabularReasoner`] answers a question over the loaded tables: a
//!   model-driven pass first, then rule-based column-role strategies.

mod cache;
mod config;
mod dataset;
mod errors;
mod fetch;
mod format;
mod loader;
mod parse;
mod prompt;
mod reasoner;
mod roles;
mod signals;
mod stats;
mod strategies;

pub use cache::{CacheKey, CacheStats, TabularCache};
pub use config::{LoaderConfig, ReasonerConfig};
pub use dataset::{Cell, TabularDataset};
pub use errors::{Result, TabularError};
pub use fetch::{BlobFetcher, FetchFuture, HttpBlobFetcher};
pub use format::fmt_number;
pub use loader::{LabeledTable, TableSpec, TabularLoader};
pub use parse::{SourceFormat, parse_dataset};
pub use reasoner::{AnalysisType, NO_DATA_ANSWER, TabularAnswer, TabularReasoner};
pub use roles::{ColumnRole, ColumnRoles};
pub use signals::QuestionSignals;
pub use strategies::{Strategy, StrategyInput, analyze_table};
