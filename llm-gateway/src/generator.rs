//! `generate(prompt) -> text` capability.
//!
//! Consumers (router, reasoner, synthesizer) depend on [`TextGenerator`]
//! rather than on the concrete service, so tests can plug in fakes.

use std::{future::Future, pin::Pin, sync::Arc};

use crate::error_handler::LlmError;
use crate::service_profiles::{LlmServiceProfiles, Profile};

/// Boxed future returned by [`TextGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// Object-safe text generation capability.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
}

/// [`TextGenerator`] bound to one profile of a shared [`LlmServiceProfiles`].
pub struct ProfileGenerator {
    svc: Arc<LlmServiceProfiles>,
    profile: Profile,
}

impl ProfileGenerator {
    pub fn new(svc: Arc<LlmServiceProfiles>, profile: Profile) -> Self {
        Self { svc, profile }
    }
}

impl TextGenerator for ProfileGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move { self.svc.generate(self.profile, prompt).await })
    }
}
