//! Runtime configuration loaded from environment variables.

use llm_gateway::error_handler::{env_flag, env_parse};

use crate::error::QaError;
use crate::router::RouterThresholds;

/// Config bag for question answering. All fields have defaults via `from_env`.
#[derive(Clone, Debug, PartialEq)]
pub struct QaConfig {
    /// Hits retrieved for semantic routes.
    pub rag_top_k: usize,
    /// Upper bound on tabular index hits (tables loaded per question).
    pub tabular_top_k: usize,
    /// Ask the model to classify before the keyword heuristic.
    pub router_llm_enabled: bool,
    pub thresholds: RouterThresholds,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            rag_top_k: 6,
            tabular_top_k: 3,
            router_llm_enabled: true,
            thresholds: RouterThresholds::default(),
        }
    }
}

impl QaConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            rag_top_k: env_parse("RAG_TOP_K", d.rag_top_k),
            tabular_top_k: env_parse("TABULAR_TOP_K", d.tabular_top_k),
            router_llm_enabled: env_flag("ROUTER_LLM_ENABLED", d.router_llm_enabled),
            thresholds: RouterThresholds {
                tabular: env_parse("ROUTER_TABULAR_CONFIDENCE", d.thresholds.tabular),
                default: env_parse("ROUTER_DEFAULT_CONFIDENCE", d.thresholds.default),
                ..d.thresholds
            },
        }
    }

    pub fn validate(&self) -> Result<(), QaError> {
        if self.rag_top_k == 0 || self.tabular_top_k == 0 {
            return Err(QaError::Config("top-k values must be > 0".into()));
        }
        let t = &self.thresholds;
        for (name, v) in [
            ("tabular", t.tabular),
            ("default", t.default),
            ("plain_label", t.plain_label),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(QaError::Config(format!(
                    "router {name} confidence must be within [0, 1], got {v}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = QaConfig::default();
        assert_eq!((c.rag_top_k, c.tabular_top_k), (6, 3));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut c = QaConfig::default();
        c.thresholds.tabular = 1.5;
        assert!(matches!(c.validate(), Err(QaError::Config(_))));
    }
}
