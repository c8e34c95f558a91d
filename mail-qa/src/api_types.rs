//! Public API types re-used by external layers (CLI, HTTP).

use serde::Serialize;
use tabular_engine::AnalysisType;

use crate::router::{ClassifierKind, Route};

/// Per-question knobs. `0` means "use the configured value".
#[derive(Clone, Debug, Default)]
pub struct AskOptions {
    /// Hits retrieved for semantic routes; the tabular route uses
    /// `min(tabular_top_k, top_k)`.
    pub top_k: usize,
}

/// Which path produced the answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    LlmAnswer,
    SynthesisFailed,
    NoRelevantContent,
    LlmTabular,
    Heuristic,
    NoData,
    Unrouted,
    RetrievalFailed,
}

impl From<AnalysisType> for AnalysisKind {
    fn from(t: AnalysisType) -> Self {
        match t {
            AnalysisType::LlmTabular => AnalysisKind::LlmTabular,
            AnalysisType::Heuristic => AnalysisKind::Heuristic,
            AnalysisType::NoData => AnalysisKind::NoData,
        }
    }
}

/// Citation of one retrieved chunk. Only fields relevant to the route are set.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SourceRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

/// Final answer with its route and analysis discriminators.
#[derive(Clone, Debug, Serialize)]
pub struct QaAnswer {
    pub route: Route,
    pub confidence: f32,
    pub classifier: ClassifierKind,
    pub analysis_type: AnalysisKind,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables_used: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previews: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}
