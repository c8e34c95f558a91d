//! Loader and reasoner knobs, read from the environment with defaults.

use std::time::Duration;

use llm_gateway::error_handler::{env_flag, env_parse};

use crate::errors::TabularError;

/// Blob fetch settings.
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Maximum number of concurrent fetch+parse tasks in one `load` call.
    pub concurrency: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            concurrency: 4,
        }
    }
}

impl LoaderConfig {
    /// Reads `FETCH_CONNECT_TIMEOUT_SECS`, `FETCH_READ_TIMEOUT_SECS`, `FETCH_CONCURRENCY`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            connect_timeout_secs: env_parse("FETCH_CONNECT_TIMEOUT_SECS", d.connect_timeout_secs),
            read_timeout_secs: env_parse("FETCH_READ_TIMEOUT_SECS", d.read_timeout_secs),
            concurrency: env_parse("FETCH_CONCURRENCY", d.concurrency),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), TabularError> {
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(TabularError::Config("fetch timeouts must be > 0".into()));
        }
        if self.concurrency == 0 {
            return Err(TabularError::Config("fetch concurrency must be > 0".into()));
        }
        Ok(())
    }
}

/// Analysis settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ReasonerConfig {
    /// Try the model-driven analysis before the rule-based one.
    pub llm_enabled: bool,
    /// Rows sampled into the model prompt per table.
    pub sample_rows: usize,
    /// Rows rendered in each table preview.
    pub preview_rows: usize,
    /// Groups reported by aggregate strategies.
    pub top_n: usize,
    /// Top values listed per categorical column in the model prompt.
    pub categorical_top: usize,
    /// Categorical columns summarized in the model prompt.
    pub max_categorical_columns: usize,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            llm_enabled: true,
            sample_rows: 10,
            preview_rows: 5,
            top_n: 5,
            categorical_top: 5,
            max_categorical_columns: 3,
        }
    }
}

impl ReasonerConfig {
    /// Reads `TABULAR_LLM_ENABLED`, `TABULAR_SAMPLE_ROWS`, `TABULAR_PREVIEW_ROWS`, `TABULAR_TOP_N`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            llm_enabled: env_flag("TABULAR_LLM_ENABLED", d.llm_enabled),
            sample_rows: env_parse("TABULAR_SAMPLE_ROWS", d.sample_rows),
            preview_rows: env_parse("TABULAR_PREVIEW_ROWS", d.preview_rows),
            top_n: env_parse("TABULAR_TOP_N", d.top_n),
            ..d
        }
    }

    pub fn validate(&self) -> Result<(), TabularError> {
        if self.preview_rows == 0 || self.top_n == 0 {
            return Err(TabularError::Config(
                "preview_rows and top_n must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let l = LoaderConfig::default();
        assert_eq!(l.connect_timeout(), Duration::from_secs(10));
        assert_eq!(l.read_timeout(), Duration::from_secs(30));
        assert!(l.validate().is_ok());

        let r = ReasonerConfig::default();
        assert_eq!((r.sample_rows, r.preview_rows, r.top_n), (10, 5, 5));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let l = LoaderConfig {
            read_timeout_secs: 0,
            ..LoaderConfig::default()
        };
        assert!(l.validate().is_err());
    }
}
