//! Shared model service with three profiles: `fast`, `slow`, and `embedding`.
//!
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches HTTP clients per distinct config.
//! - Every call is bounded by the profile's overall timeout.
//! - Whitespace-only generations are reported as [`LlmError::EmptyOutput`].
//! - If `slow` is not provided, it falls back to `fast`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use llm_gateway::{LlmModelConfig, LlmProvider, LlmServiceProfiles, Profile};
//!
//! # async fn run() -> Result<(), llm_gateway::LlmError> {
//! let fast = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "qwen3:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(128),
//!     temperature: Some(0.0),
//!     top_p: None,
//!     timeout_secs: Some(30),
//! };
//! let embedding = LlmModelConfig { model: "nomic-embed-text".into(), ..fast.clone() };
//!
//! let svc = Arc::new(LlmServiceProfiles::new(fast, None, embedding)?);
//! let text = svc.generate(Profile::Fast, "Say hi").await?;
//! let vector = svc.embed("Ferris").await?;
//! # let _ = (text, vector);
//! # Ok(()) }
//! ```

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::LlmError,
    generator::{ProfileGenerator, TextGenerator},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Generation profile selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Short, deterministic calls (intent classification).
    Fast,
    /// Quality calls (synthesis, tabular reasoning).
    Slow,
}

pub struct LlmServiceProfiles {
    fast: LlmModelConfig,
    slow: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    /// Creates the service after validating every profile.
    pub fn new(
        fast: LlmModelConfig,
        slow_opt: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
    ) -> Result<Self, LlmError> {
        let slow = slow_opt.unwrap_or_else(|| fast.clone());
        fast.validate()?;
        slow.validate()?;
        embedding.validate()?;

        Ok(Self {
            fast,
            slow,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        })
    }

    /// Builds all three profiles from environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        use crate::config::default_config::{config_embedding, config_fast, config_slow};
        Self::new(config_fast()?, Some(config_slow()?), config_embedding()?)
    }

    /// Generates text with the selected profile.
    ///
    /// # Errors
    /// - [`LlmError::Timeout`] when the profile deadline expires
    /// - [`LlmError::EmptyOutput`] when the model answers with whitespace only
    /// - transport/provider errors otherwise
    pub async fn generate(&self, profile: Profile, prompt: &str) -> Result<String, LlmError> {
        let cfg = self.profile(profile);
        debug!(?profile, model = %cfg.model, "generate");

        let text = with_deadline(cfg.call_timeout(), async {
            match cfg.provider {
                LlmProvider::Ollama => self.ollama_client(cfg).await?.generate(prompt).await,
                LlmProvider::OpenAI => self.openai_client(cfg).await?.generate(prompt).await,
            }
        })
        .await?;

        non_empty(text)
    }

    /// Computes one embedding vector with the embedding profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        let cfg = &self.embedding;
        let vector = with_deadline(cfg.call_timeout(), async {
            match cfg.provider {
                LlmProvider::Ollama => self.ollama_client(cfg).await?.embeddings(input).await,
                LlmProvider::OpenAI => self.openai_client(cfg).await?.embeddings(input).await,
            }
        })
        .await?;

        if vector.is_empty() {
            return Err(LlmError::EmptyOutput);
        }
        Ok(vector)
    }

    /// Returns a `generate(prompt) -> text` capability bound to `profile`.
    pub fn generator(self: &Arc<Self>, profile: Profile) -> Arc<dyn TextGenerator> {
        Arc::new(ProfileGenerator::new(Arc::clone(self), profile))
    }

    /// Config behind a generation profile.
    pub fn profile(&self, profile: Profile) -> &LlmModelConfig {
        match profile {
            Profile::Fast => &self.fast,
            Profile::Slow => &self.slow,
        }
    }

    pub fn embedding_profile(&self) -> &LlmModelConfig {
        &self.embedding
    }

    /* --------------------- Internals --------------------- */

    async fn ollama_client(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, LlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, Arc::clone(&cli));
        Ok(cli)
    }

    async fn openai_client(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, LlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, Arc::clone(&cli));
        Ok(cli)
    }
}

/// Runs `fut` with an overall deadline, mapping expiry to [`LlmError::Timeout`].
pub(crate) async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => {
            warn!(?limit, "model call timed out");
            Err(LlmError::Timeout(limit))
        }
    }
}

/// Rejects whitespace-only output.
pub(crate) fn non_empty(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyOutput)
    } else {
        Ok(text)
    }
}

/// Cache key for a client; sampling knobs are part of the key since clients
/// carry their config.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
    max_tokens: Option<u32>,
    temperature_bits: Option<u32>,
    top_p_bits: Option<u32>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
            max_tokens: cfg.max_tokens,
            temperature_bits: cfg.temperature.map(f32::to_bits),
            top_p_bits: cfg.top_p.map(f32::to_bits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(model: &str, temperature: f32) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(temperature),
            top_p: None,
            timeout_secs: Some(1),
        }
    }

    #[tokio::test]
    async fn deadline_maps_to_timeout() {
        let res: Result<(), LlmError> = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(LlmError::Timeout(d)) if d == Duration::from_millis(10)));
    }

    #[test]
    fn whitespace_output_is_rejected() {
        assert!(matches!(non_empty(" \n\t".into()), Err(LlmError::EmptyOutput)));
        assert_eq!(non_empty(" ok ".into()).ok().as_deref(), Some(" ok "));
    }

    #[test]
    fn slow_falls_back_to_fast_and_keys_differ_by_sampling() {
        let svc = LlmServiceProfiles::new(cfg("m", 0.0), None, cfg("e", 0.0)).unwrap();
        assert_eq!(svc.profile(Profile::Slow), svc.profile(Profile::Fast));

        let a = ClientKey::from(&cfg("m", 0.0));
        let b = ClientKey::from(&cfg("m", 0.2));
        assert!(a != b);
    }

    #[test]
    fn invalid_profile_is_rejected_at_construction() {
        let mut bad = cfg("m", 0.0);
        bad.endpoint = "nope".into();
        assert!(LlmServiceProfiles::new(bad, None, cfg("e", 0.0)).is_err());
    }
}
