//! Profile configs loaded from environment variables.
//!
//! Three roles share one provider kind:
//!
//! - **Fast**      → intent classification (short JSON answers)
//! - **Slow**      → answer synthesis and tabular reasoning
//! - **Embedding** → query/chunk embeddings
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`               = `ollama` (default) or `openai`
//! - `GENERATION_MODEL`       = slow/quality model (mandatory)
//! - `GENERATION_MODEL_FAST`  = fast model (optional, defaults to `GENERATION_MODEL`)
//! - `EMBEDDING_MODEL`        = embedding model (mandatory)
//! - `LLM_MAX_TOKENS`         = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`       = overall generation timeout (default 60)
//! - `EMBEDDING_TIMEOUT_SECS` = overall embedding timeout (default 30)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT`
//!
//! OpenAI:
//! - `OPENAI_URL` (default `https://api.openai.com`)
//! - `OPENAI_API_KEY` (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, LlmError, env_opt_u32, env_opt_u64, must_env},
};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Resolves the provider kind from `LLM_KIND` (defaults to Ollama).
pub fn provider_from_env() -> Result<LlmProvider, LlmError> {
    match std::env::var("LLM_KIND") {
        Ok(kind) if !kind.trim().is_empty() => Ok(kind.parse::<LlmProvider>()?),
        _ => Ok(LlmProvider::Ollama),
    }
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, LlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{}", port.trim()));
        }
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Endpoint and API key for the given provider.
fn endpoint_and_key(provider: LlmProvider) -> Result<(String, Option<String>), LlmError> {
    match provider {
        LlmProvider::Ollama => Ok((ollama_endpoint()?, None)),
        LlmProvider::OpenAI => {
            let endpoint = std::env::var("OPENAI_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
            Ok((endpoint, Some(must_env("OPENAI_API_KEY")?)))
        }
    }
}

/// Config for the **slow/quality** generation profile.
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = LLM_TIMEOUT_SECS or 60`
pub fn config_slow() -> Result<LlmModelConfig, LlmError> {
    let provider = provider_from_env()?;
    let (endpoint, api_key) = endpoint_and_key(provider)?;
    let cfg = LlmModelConfig {
        provider,
        model: must_env("GENERATION_MODEL")?,
        endpoint,
        api_key,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(60)),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Config for the **fast** generation profile.
///
/// Uses `GENERATION_MODEL_FAST` when set, otherwise the slow model.
///
/// # Defaults
/// - `temperature = Some(0.0)` (classification wants stable output)
/// - `max_tokens = Some(128)`
pub fn config_fast() -> Result<LlmModelConfig, LlmError> {
    let slow = config_slow()?;
    let model = std::env::var("GENERATION_MODEL_FAST")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slow.model.clone());
    let cfg = LlmModelConfig {
        model,
        temperature: Some(0.0),
        max_tokens: Some(128),
        ..slow
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Config for the **embedding** profile.
///
/// # Defaults
/// - `temperature = Some(0.0)`
/// - `timeout_secs = EMBEDDING_TIMEOUT_SECS or 30`
pub fn config_embedding() -> Result<LlmModelConfig, LlmError> {
    let provider = provider_from_env()?;
    let (endpoint, api_key) = endpoint_and_key(provider)?;
    let cfg = LlmModelConfig {
        provider,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(env_opt_u64("EMBEDDING_TIMEOUT_SECS")?.unwrap_or(30)),
    };
    cfg.validate()?;
    Ok(cfg)
}
