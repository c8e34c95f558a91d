use std::time::Duration;

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, validate_http_endpoint, validate_range_f32};

/// Default overall timeout for a single provider call.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;

/// Configuration for one model profile.
///
/// - `provider`: backend (Ollama or OpenAI).
/// - `model`: model identifier (e.g. `"qwen3:14b"`, `"nomic-embed-text"`).
/// - `endpoint`: base URL of the provider.
/// - `api_key`: required for OpenAI, ignored by Ollama.
/// - `max_tokens`, `temperature`, `top_p`: sampling knobs, forwarded when set.
/// - `timeout_secs`: overall call timeout; the call is failed on expiry.
///
/// # Example
/// ```
/// use llm_gateway::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "qwen3:14b".into(),
///     endpoint: "http://localhost:11434".into(),
///     api_key: None,
///     max_tokens: Some(512),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(30),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Effective overall call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
        )
    }

    /// Validates endpoint, model name and sampling ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "timeout_secs",
                detail: "expected a positive number of seconds",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "m".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn call_timeout_defaults_when_unset() {
        assert_eq!(base().call_timeout(), Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS));
        let cfg = LlmModelConfig {
            timeout_secs: Some(5),
            ..base()
        };
        assert_eq!(cfg.call_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let empty_model = LlmModelConfig {
            model: " ".into(),
            ..base()
        };
        assert!(matches!(empty_model.validate(), Err(ConfigError::EmptyModel)));

        let bad_endpoint = LlmModelConfig {
            endpoint: "localhost:11434".into(),
            ..base()
        };
        assert!(matches!(
            bad_endpoint.validate(),
            Err(ConfigError::InvalidFormat { .. })
        ));

        let hot = LlmModelConfig {
            temperature: Some(3.5),
            ..base()
        };
        assert!(matches!(hot.validate(), Err(ConfigError::OutOfRange { .. })));

        let zero_timeout = LlmModelConfig {
            timeout_secs: Some(0),
            ..base()
        };
        assert!(zero_timeout.validate().is_err());
    }
}
