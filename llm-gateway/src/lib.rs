//! Shared model gateway for the mail RAG backend.
//!
//! Wraps the external generative and embedding providers behind two small
//! capabilities:
//! - [`TextGenerator`]: `generate(prompt) -> text`
//! - [`LlmServiceProfiles::embed`]: `embed(text) -> vector`
//!
//! Every call is bounded by an overall timeout and every failure is reported
//! as a typed [`LlmError`]; callers decide which fallback to run.

pub mod config;
pub mod error_handler;
pub mod generator;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{ConfigError, LlmError};
pub use generator::{ProfileGenerator, TextGenerator};
pub use service_profiles::{LlmServiceProfiles, Profile};
