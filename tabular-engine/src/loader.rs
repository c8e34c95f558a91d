//! Re-materializes tabular attachments from their locators.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, TabularCache};
use crate::config::LoaderConfig;
use crate::dataset::TabularDataset;
use crate::errors::TabularError;
use crate::fetch::{BlobFetcher, short};
use crate::parse::{SourceFormat, parse_dataset};

/// Where a table lives: locator, filename (drives the parser), optional sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub locator: String,
    pub filename: String,
    #[serde(default)]
    pub sheet: Option<String>,
}

impl TableSpec {
    pub fn new(locator: impl Into<String>, filename: impl Into<String>, sheet: Option<String>) -> Self {
        Self {
            locator: locator.into(),
            filename: filename.into(),
            sheet: sheet.filter(|s| !s.trim().is_empty()),
        }
    }

    /// `filename:sheet` when a sheet is named, else `filename`.
    pub fn label(&self) -> String {
        match &self.sheet {
            Some(s) => format!("{}:{}", self.filename, s),
            None => self.filename.clone(),
        }
    }
}

/// A loaded table with its display label.
#[derive(Clone, Debug)]
pub struct LabeledTable {
    pub label: String,
    pub dataset: Arc<TabularDataset>,
}

/// Fetch + parse with byte and dataset memoization.
pub struct TabularLoader {
    fetcher: Arc<dyn BlobFetcher>,
    cache: Arc<TabularCache>,
    concurrency: usize,
}

impl TabularLoader {
    pub fn new(fetcher: Arc<dyn BlobFetcher>, cache: Arc<TabularCache>, cfg: &LoaderConfig) -> Self {
        Self {
            fetcher,
            cache,
            concurrency: cfg.concurrency.max(1),
        }
    }

    pub fn cache(&self) -> &Arc<TabularCache> {
        &self.cache
    }

    /// Loads every spec; failures are logged and omitted, order follows input.
    pub async fn load(&self, specs: &[TableSpec]) -> Vec<LabeledTable> {
        info!(specs = specs.len(), "loading tables");

        let loaded: Vec<Option<LabeledTable>> = stream::iter(specs.iter().enumerate())
            .map(|(i, spec)| async move {
                match self.load_one(spec).await {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!(
                            index = i,
                            label = %spec.label(),
                            locator = %short(&spec.locator),
                            error = %e,
                            "skipping table"
                        );
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let out: Vec<LabeledTable> = loaded.into_iter().flatten().collect();
        info!(loaded = out.len(), requested = specs.len(), "tables loaded");
        out
    }

    async fn load_one(&self, spec: &TableSpec) -> Result<LabeledTable, TabularError> {
        let label = spec.label();
        if spec.locator.trim().is_empty() {
            return Err(TabularError::Fetch {
                locator: String::new(),
                reason: "empty locator".into(),
            });
        }
        // Reject unsupported files before any I/O.
        SourceFormat::from_filename(&spec.filename)?;

        let ds_key = CacheKey::dataset(&spec.locator, &spec.filename, spec.sheet.as_deref());
        if let Some(dataset) = self.cache.get_dataset(&ds_key).await {
            debug!(%label, "dataset cache hit");
            return Ok(LabeledTable { label, dataset });
        }

        let blob_key = CacheKey::blob(&spec.locator, &spec.filename);
        let bytes = match self.cache.get_blob(&blob_key).await {
            Some(b) => {
                debug!(%label, bytes = b.len(), "blob cache hit");
                b
            }
            None => {
                let b = self.fetcher.fetch(&spec.locator).await?;
                self.cache.put_blob(blob_key, b.clone()).await;
                b
            }
        };

        let dataset = Arc::new(parse_dataset(
            &label,
            &spec.filename,
            spec.sheet.as_deref(),
            &bytes,
        )?);
        self.cache.put_dataset(ds_key, Arc::clone(&dataset)).await;
        Ok(LabeledTable { label, dataset })
    }
}
