//! Intent router: picks the retrieval route for a question.
//!
//! The model classifier runs first; any failure (transport, timeout,
//! malformed reply, disabled) falls back to the keyword heuristic, which
//! never fails.

use std::fmt;
use std::sync::Arc;

use llm_gateway::TextGenerator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::QaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    MailBodySemantic,
    AttachmentTabular,
    AttachmentSemantic,
    Unknown,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::MailBodySemantic,
        Route::AttachmentTabular,
        Route::AttachmentSemantic,
        Route::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Route::MailBodySemantic => "mail_body_semantic",
            Route::AttachmentTabular => "attachment_tabular",
            Route::AttachmentSemantic => "attachment_semantic",
            Route::Unknown => "unknown",
        }
    }

    /// Exact label match (trimmed, case-insensitive).
    pub fn from_label(s: &str) -> Option<Route> {
        let s = s.trim();
        Route::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Llm,
    Heuristic,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteDecision {
    pub route: Route,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    pub classifier: ClassifierKind,
    pub reason: String,
}

/// Confidence constants of the router.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouterThresholds {
    /// Heuristic: a tabular hint matched.
    pub tabular: f32,
    /// Heuristic: attachment/mail-body default.
    pub default: f32,
    /// Model reply that only names a label.
    pub plain_label: f32,
}

impl Default for RouterThresholds {
    fn default() -> Self {
        Self {
            tabular: 0.7,
            default: 0.6,
            plain_label: 0.6,
        }
    }
}

/// Substrings that point at spreadsheet-style questions. Some carry a
/// trailing space on purpose (`"by "`, `"per "`, `"vs "`).
pub const TABULAR_HINTS: &[&str] = &[
    "sum", "average", "avg", "mean", "median", "max", "min", "count", "top", "trend", "by ",
    "group", "grouped", "aggregate", "pivot", "table", "sheet", "excel", "csv", "filter", "where",
    "per ", "vs ", "compare", "correlation",
];

/// Confidence used when the model omits one.
const DEFAULT_MODEL_CONFIDENCE: f32 = 0.5;

fn blank_decision() -> RouteDecision {
    RouteDecision {
        route: Route::Unknown,
        confidence: 0.0,
        classifier: ClassifierKind::Heuristic,
        reason: "blank question".into(),
    }
}

/// Keyword classifier. Total: every input maps to a route.
pub fn classify_heuristic(question: &str, t: &RouterThresholds) -> RouteDecision {
    let q = question.to_lowercase();
    if q.trim().is_empty() {
        return blank_decision();
    }
    let (route, confidence, reason) = if let Some(h) = TABULAR_HINTS.iter().find(|h| q.contains(**h)) {
        (Route::AttachmentTabular, t.tabular, format!("tabular hint {:?}", h.trim()))
    } else if q.contains("attachment") || q.contains("pdf") {
        (Route::AttachmentSemantic, t.default, "mentions an attachment".to_string())
    } else {
        (Route::MailBodySemantic, t.default, "default to mail bodies".to_string())
    };
    RouteDecision {
        route,
        confidence: confidence.clamp(0.0, 1.0),
        classifier: ClassifierKind::Heuristic,
        reason,
    }
}

/// Parses a model reply: a JSON object (first `{` to last `}`) with
/// `route`, `confidence`, `reason`, or else a reply naming exactly one label.
pub fn parse_llm_route(text: &str, t: &RouterThresholds) -> Result<RouteDecision, QaError> {
    if let Some(obj) = extract_json_object(text) {
        let route = obj
            .get("route")
            .and_then(Value::as_str)
            .and_then(Route::from_label)
            .unwrap_or(Route::Unknown);
        let confidence = obj
            .get("confidence")
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .map(|c| c as f32)
            .filter(|c| c.is_finite())
            .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
            .clamp(0.0, 1.0);
        let reason = obj
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        return Ok(RouteDecision {
            route,
            confidence,
            classifier: ClassifierKind::Llm,
            reason,
        });
    }

    let lower = text.to_lowercase();
    let named: Vec<Route> = Route::ALL
        .into_iter()
        .filter(|r| lower.contains(r.as_str()))
        .collect();
    match named.as_slice() {
        [only] => Ok(RouteDecision {
            route: *only,
            confidence: t.plain_label.clamp(0.0, 1.0),
            classifier: ClassifierKind::Llm,
            reason: "plain label reply".into(),
        }),
        _ => Err(QaError::MalformedRoute(snippet(text))),
    }
}

fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn snippet(s: &str) -> String {
    let mut out: String = s.chars().take(120).collect();
    if s.chars().count() > 120 {
        out.push('…');
    }
    out
}

pub fn build_router_prompt(question: &str) -> String {
    let labels: Vec<&str> = Route::ALL.iter().map(|r| r.as_str()).collect();
    format!(
        "Classify the user's question into exactly one route.\n\
         - mail_body_semantic: the answer is likely in the email body text.\n\
         - attachment_tabular: the question implies numeric analysis, aggregation, filtering, or spreadsheet/CSV data operations.\n\
         - attachment_semantic: the answer is likely in non-tabular attachments (PDF or long text).\n\
         Respond as compact JSON: {{\"route\": <label>, \"confidence\": 0..1, \"reason\": <short>}}.\n\
         Valid labels: {}.\n\nQuestion: {}\nJSON:",
        labels.join(", "),
        question.trim()
    )
}

/// Model-first router with the keyword heuristic as fallback.
pub struct IntentRouter {
    generator: Option<Arc<dyn TextGenerator>>,
    thresholds: RouterThresholds,
}

impl IntentRouter {
    /// `generator = None` disables the model classifier.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, thresholds: RouterThresholds) -> Self {
        Self {
            generator,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &RouterThresholds {
        &self.thresholds
    }

    /// Never fails; see the module docs for the fallback order.
    pub async fn classify(&self, question: &str) -> RouteDecision {
        if question.trim().is_empty() {
            return blank_decision();
        }
        let Some(generator) = &self.generator else {
            return classify_heuristic(question, &self.thresholds);
        };

        match self.classify_llm(generator.as_ref(), question).await {
            Ok(d) => {
                debug!(route = %d.route, confidence = d.confidence, "model route");
                d
            }
            Err(e) => {
                warn!(error = %e, "model routing failed; using keyword heuristic");
                classify_heuristic(question, &self.thresholds)
            }
        }
    }

    async fn classify_llm(
        &self,
        generator: &dyn TextGenerator,
        question: &str,
    ) -> Result<RouteDecision, QaError> {
        let prompt = build_router_prompt(question);
        let reply = generator.generate(&prompt).await?;
        parse_llm_route(&reply, &self.thresholds)
    }
}
