//! One grounded generative call over numbered contexts.

use std::sync::Arc;

use llm_gateway::TextGenerator;
use tracing::{debug, instrument};

use crate::context::ContextBlock;
use crate::error::QaError;
use crate::prompt::build_grounded_prompt;

pub struct AnswerSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Answer trimmed of surrounding whitespace; an empty answer is an error.
    /// Empty `contexts` are not special-cased here.
    #[instrument(skip_all, fields(contexts = contexts.len()))]
    pub async fn synthesize(
        &self,
        question: &str,
        contexts: &[ContextBlock],
    ) -> Result<String, QaError> {
        let prompt = build_grounded_prompt(question, contexts);
        debug!(prompt_chars = prompt.len(), "synthesizing");
        let raw = self.generator.generate(&prompt).await?;
        let answer = raw.trim();
        if answer.is_empty() {
            return Err(QaError::EmptyAnswer);
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LocationHint;
    use llm_gateway::LlmError;
    use llm_gateway::generator::GenerateFuture;
    use std::sync::Mutex;

    struct Echo {
        reply: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl TextGenerator for Echo {
        fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
            if let Ok(mut s) = self.seen.lock() {
                s.push(prompt.to_string());
            }
            let reply = self.reply;
            Box::pin(async move { Ok::<_, LlmError>(reply.to_string()) })
        }
    }

    fn echo(reply: &'static str) -> Arc<Echo> {
        Arc::new(Echo {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn trims_the_answer() {
        let s = AnswerSynthesizer::new(echo("\n  Friday at 10.  \n"));
        let out = s.synthesize("when?", &[]).await.unwrap();
        assert_eq!(out, "Friday at 10.");
    }

    #[tokio::test]
    async fn blank_answer_is_a_failure() {
        let s = AnswerSynthesizer::new(echo("   "));
        assert!(matches!(s.synthesize("when?", &[]).await, Err(QaError::EmptyAnswer)));
    }

    #[tokio::test]
    async fn citations_only_come_from_context_metadata() {
        let g = echo("ok");
        let s = AnswerSynthesizer::new(g.clone());
        let ctx = vec![
            ContextBlock {
                text: "Totals are on page 9 of the appendix".into(),
                source_label: "q3.pdf".into(),
                location: Some(LocationHint::Page(3)),
            },
            ContextBlock {
                text: "plain mail".into(),
                source_label: "Re: budget".into(),
                location: None,
            },
        ];
        s.synthesize("where are totals?", &ctx).await.unwrap();

        let seen = g.seen.lock().unwrap();
        let prompt = &seen[0];
        let annotations: Vec<&str> = prompt
            .lines()
            .filter(|l| l.starts_with('['))
            .collect();
        assert_eq!(annotations, vec!["[1] q3.pdf (page 3)", "[2] Re: budget"]);
    }
}
