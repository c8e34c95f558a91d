//! Question answering over ingested mail.
//!
//! Public API: [`MailQa`]. [`MailQa::ask`] classifies the question, retrieves
//! from the matching collection and either synthesizes a grounded answer or
//! loads the referenced spreadsheets and analyzes them. The building blocks
//! (`classify_intent`, `top_k`, `load_tables`, `analyze_tabular`,
//! `synthesize_answer`) are exposed on their own as well.
//!
//! `ask` never fails: every failure degrades to a fixed answer with the
//! error kept in `diagnostic`.

mod api_types;
mod cfg;
mod context;
mod error;
mod progress;
mod prompt;
mod router;
mod synthesizer;

pub use api_types::{AnalysisKind, AskOptions, QaAnswer, SourceRef};
pub use cfg::QaConfig;
pub use context::{ContextBlock, LocationHint, source_label, table_spec_from_hit};
pub use error::QaError;
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use prompt::build_grounded_prompt;
pub use router::{
    ClassifierKind, IntentRouter, Route, RouteDecision, RouterThresholds, classify_heuristic,
    parse_llm_route,
};
pub use synthesizer::AnswerSynthesizer;

use std::sync::Arc;

use llm_gateway::TextGenerator;
use mail_store::record::meta_str;
use mail_store::{CollectionKind, ContentStore, EmbeddingsProvider, RagHit, RagQuery};
use tabular_engine::{LabeledTable, TableSpec, TabularAnswer, TabularLoader, TabularReasoner};
use tracing::{info, instrument, warn};

pub const NO_MAIL_ANSWER: &str = "I don't know based on the available mail bodies.";
pub const NO_ATTACHMENT_ANSWER: &str = "I don't know based on the available attachments.";
pub const NO_TABLE_ANSWER: &str = "No relevant tabular attachments found.";
pub const UNROUTED_ANSWER: &str = "I couldn't determine how to answer this question.";
pub const RETRIEVAL_FAILED_ANSWER: &str =
    "I couldn't search the available content right now. Please try again later.";
pub const SYNTHESIS_FAILED_ANSWER: &str =
    "I found relevant content but couldn't generate an answer right now. Please try again later.";

/// Everything [`MailQa`] composes. The store and loader are shared handles.
pub struct QaParts {
    pub store: Arc<ContentStore>,
    pub embedder: Arc<dyn EmbeddingsProvider>,
    /// Classifier model (usually the fast profile); ignored when routing by
    /// model is disabled.
    pub router_generator: Option<Arc<dyn TextGenerator>>,
    /// Answer model (usually the slow profile).
    pub answer_generator: Arc<dyn TextGenerator>,
    pub loader: Arc<TabularLoader>,
    pub reasoner: TabularReasoner,
}

pub struct MailQa {
    cfg: QaConfig,
    store: Arc<ContentStore>,
    embedder: Arc<dyn EmbeddingsProvider>,
    router: IntentRouter,
    synthesizer: AnswerSynthesizer,
    loader: Arc<TabularLoader>,
    reasoner: TabularReasoner,
}

impl MailQa {
    pub fn new(cfg: QaConfig, parts: QaParts) -> Result<Self, QaError> {
        cfg.validate()?;
        let router_generator = if cfg.router_llm_enabled {
            parts.router_generator
        } else {
            None
        };
        Ok(Self {
            router: IntentRouter::new(router_generator, cfg.thresholds),
            synthesizer: AnswerSynthesizer::new(parts.answer_generator),
            store: parts.store,
            embedder: parts.embedder,
            loader: parts.loader,
            reasoner: parts.reasoner,
            cfg,
        })
    }

    pub fn config(&self) -> &QaConfig {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    /// Route and confidence for a question. Never fails.
    pub async fn classify_intent(&self, question: &str) -> RouteDecision {
        self.router.classify(question).await
    }

    /// Nearest chunks of one collection (k = 0 is raised to 1).
    pub async fn top_k(
        &self,
        kind: CollectionKind,
        question: &str,
        k: usize,
    ) -> Result<Vec<RagHit>, QaError> {
        let query = RagQuery {
            text: question,
            top_k: k,
            filter: None,
        };
        Ok(self.store.top_k(kind, query, self.embedder.as_ref()).await?)
    }

    /// Loads the referenced tables; failed entries are omitted.
    pub async fn load_tables(&self, specs: &[TableSpec]) -> Vec<LabeledTable> {
        self.loader.load(specs).await
    }

    pub async fn analyze_tabular(&self, question: &str, tables: &[LabeledTable]) -> TabularAnswer {
        self.reasoner.analyze(question, tables).await
    }

    pub async fn synthesize_answer(
        &self,
        question: &str,
        contexts: &[ContextBlock],
    ) -> Result<String, QaError> {
        self.synthesizer.synthesize(question, contexts).await
    }

    /// Answers a question without progress output.
    pub async fn ask(&self, question: &str, opts: AskOptions) -> QaAnswer {
        self.ask_with_progress(question, opts, &NoopProgress).await
    }

    #[instrument(skip_all, fields(question_len = question.len()))]
    pub async fn ask_with_progress(
        &self,
        question: &str,
        opts: AskOptions,
        prog: &dyn Progress,
    ) -> QaAnswer {
        let k = if opts.top_k == 0 {
            self.cfg.rag_top_k
        } else {
            opts.top_k
        };

        prog.step("classifying question");
        let decision = self.classify_intent(question).await;
        info!(
            route = %decision.route,
            confidence = decision.confidence,
            classifier = ?decision.classifier,
            "question routed"
        );

        let answer = match decision.route {
            Route::MailBodySemantic => {
                self.semantic(question, &decision, CollectionKind::MailBodies, k, prog)
                    .await
            }
            Route::AttachmentSemantic => {
                self.semantic(question, &decision, CollectionKind::AttachmentsSemantic, k, prog)
                    .await
            }
            Route::AttachmentTabular => self.tabular(question, &decision, k, prog).await,
            Route::Unknown => reply(&decision, AnalysisKind::Unrouted, UNROUTED_ANSWER),
        };
        prog.finish("done");
        answer
    }

    async fn semantic(
        &self,
        question: &str,
        decision: &RouteDecision,
        kind: CollectionKind,
        k: usize,
        prog: &dyn Progress,
    ) -> QaAnswer {
        prog.step("retrieving context");
        let hits = match self.top_k(kind, question, k).await {
            Ok(h) => h,
            Err(e) => return retrieval_failed(decision, e),
        };
        if hits.is_empty() {
            let text = match kind {
                CollectionKind::MailBodies => NO_MAIL_ANSWER,
                _ => NO_ATTACHMENT_ANSWER,
            };
            return reply(decision, AnalysisKind::NoRelevantContent, text);
        }

        let contexts: Vec<ContextBlock> = hits.iter().map(ContextBlock::from_hit).collect();
        let sources = hits.iter().map(|h| source_ref(kind, h)).collect();

        prog.step("generating answer");
        match self.synthesize_answer(question, &contexts).await {
            Ok(answer) => QaAnswer {
                sources,
                ..reply(decision, AnalysisKind::LlmAnswer, &answer)
            },
            Err(e) => {
                warn!(error = %e, "answer synthesis failed");
                QaAnswer {
                    sources,
                    diagnostic: Some(e.to_string()),
                    ..reply(decision, AnalysisKind::SynthesisFailed, SYNTHESIS_FAILED_ANSWER)
                }
            }
        }
    }

    async fn tabular(
        &self,
        question: &str,
        decision: &RouteDecision,
        k: usize,
        prog: &dyn Progress,
    ) -> QaAnswer {
        let kind = CollectionKind::AttachmentsTabularIdx;
        prog.step("finding tables");
        let hits = match self.top_k(kind, question, self.cfg.tabular_top_k.min(k)).await {
            Ok(h) => h,
            Err(e) => return retrieval_failed(decision, e),
        };
        if hits.is_empty() {
            return reply(decision, AnalysisKind::NoRelevantContent, NO_TABLE_ANSWER);
        }

        let specs: Vec<TableSpec> = hits.iter().map(table_spec_from_hit).collect();
        let sources = hits.iter().map(|h| source_ref(kind, h)).collect();

        prog.step("loading tables");
        let tables = self.load_tables(&specs).await;
        prog.step("analyzing tables");
        let analysis = self.analyze_tabular(question, &tables).await;

        QaAnswer {
            route: decision.route,
            confidence: decision.confidence,
            classifier: decision.classifier,
            analysis_type: analysis.analysis_type.into(),
            answer: analysis.answer,
            sources,
            tables_used: analysis.tables_used,
            previews: analysis.previews,
            diagnostic: analysis.diagnostic,
        }
    }
}

fn reply(decision: &RouteDecision, kind: AnalysisKind, answer: &str) -> QaAnswer {
    QaAnswer {
        route: decision.route,
        confidence: decision.confidence,
        classifier: decision.classifier,
        analysis_type: kind,
        answer: answer.to_string(),
        sources: Vec::new(),
        tables_used: Vec::new(),
        previews: Vec::new(),
        diagnostic: None,
    }
}

fn retrieval_failed(decision: &RouteDecision, e: QaError) -> QaAnswer {
    warn!(error = %e, "retrieval failed");
    QaAnswer {
        diagnostic: Some(e.to_string()),
        ..reply(decision, AnalysisKind::RetrievalFailed, RETRIEVAL_FAILED_ANSWER)
    }
}

fn source_ref(kind: CollectionKind, hit: &RagHit) -> SourceRef {
    let m = &hit.metadata;
    let text = |k: &str| meta_str(m, k).map(str::to_string);
    match kind {
        CollectionKind::MailBodies => SourceRef {
            subject: text(context::KEY_SUBJECT),
            sender: text(context::KEY_SENDER),
            ..SourceRef::default()
        },
        CollectionKind::AttachmentsSemantic => SourceRef {
            filename: text(context::KEY_FILENAME),
            page: m.get(context::KEY_PAGE).and_then(|v| v.as_int()),
            ..SourceRef::default()
        },
        CollectionKind::AttachmentsTabularIdx => SourceRef {
            filename: text(context::KEY_FILENAME),
            sheet: text(context::KEY_SHEET),
            ..SourceRef::default()
        },
    }
}
