//! Two-tier analysis over loaded tables.
//!
//! Tier A asks the model with a data brief; on any failure the rule-based
//! Tier B runs. With no tables neither tier runs; when every table is empty
//! only the empty-sheet report is produced.

use std::sync::Arc;

use llm_gateway::TextGenerator;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ReasonerConfig;
use crate::errors::{Result, TabularError};
use crate::loader::LabeledTable;
use crate::prompt::build_prompt;
use crate::roles::ColumnRoles;
use crate::signals::QuestionSignals;
use crate::strategies::{StrategyInput, analyze_table, empty_sheet};

pub const NO_DATA_ANSWER: &str = "No tabular data could be loaded for analysis. \
The attachment files may be unavailable, too large, or in an unsupported format.";

/// Which tier produced an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    LlmTabular,
    Heuristic,
    NoData,
}

#[derive(Clone, Debug, Serialize)]
pub struct TabularAnswer {
    pub answer: String,
    pub tables_used: Vec<String>,
    pub previews: Vec<String>,
    pub analysis_type: AnalysisType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

pub struct TabularReasoner {
    generator: Option<Arc<dyn TextGenerator>>,
    cfg: ReasonerConfig,
}

impl TabularReasoner {
    /// `generator = None` means Tier B only.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, cfg: ReasonerConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { generator, cfg })
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.cfg
    }

    pub async fn analyze(&self, question: &str, tables: &[LabeledTable]) -> TabularAnswer {
        if tables.is_empty() {
            info!("no tables to analyze");
            return TabularAnswer {
                answer: NO_DATA_ANSWER.to_string(),
                tables_used: Vec::new(),
                previews: Vec::new(),
                analysis_type: AnalysisType::NoData,
                diagnostic: None,
            };
        }

        let tables_used = tables.iter().map(|t| t.label.clone()).collect();
        let previews = tables
            .iter()
            .map(|t| t.dataset.preview(&t.label, self.cfg.preview_rows))
            .collect();

        if tables.iter().all(|t| t.dataset.is_empty()) {
            info!(tables = tables.len(), "all tables empty; skipping model analysis");
            return TabularAnswer {
                answer: self.tier_b(question, tables),
                tables_used,
                previews,
                analysis_type: AnalysisType::Heuristic,
                diagnostic: None,
            };
        }

        let diagnostic = match self.tier_a(question, tables).await {
            Some(Ok(answer)) => {
                info!(tables = tables.len(), "tabular answer from model");
                return TabularAnswer {
                    answer: with_empty_notices(tables, answer),
                    tables_used,
                    previews,
                    analysis_type: AnalysisType::LlmTabular,
                    diagnostic: None,
                };
            }
            Some(Err(e)) => {
                warn!(error = %e, "model analysis failed; using rule-based analysis");
                Some(e.to_string())
            }
            None => None,
        };

        TabularAnswer {
            answer: self.tier_b(question, tables),
            tables_used,
            previews,
            analysis_type: AnalysisType::Heuristic,
            diagnostic,
        }
    }

    /// `None` when Tier A is disabled or has no generator.
    async fn tier_a(
        &self,
        question: &str,
        tables: &[LabeledTable],
    ) -> Option<std::result::Result<String, TabularError>> {
        let generator = match (&self.generator, self.cfg.llm_enabled) {
            (Some(g), true) => g,
            _ => return None,
        };
        let prompt = build_prompt(question, tables, &self.cfg);
        debug!(prompt_chars = prompt.len(), "tier A prompt built");

        let res = match generator.generate(&prompt).await {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    Err(TabularError::Generation(llm_gateway::LlmError::EmptyOutput))
                } else {
                    Ok(text)
                }
            }
            Err(e) => Err(TabularError::from(e)),
        };
        Some(res)
    }

    fn tier_b(&self, question: &str, tables: &[LabeledTable]) -> String {
        let signals = QuestionSignals::extract(question);
        tables
            .iter()
            .map(|t| {
                let roles = ColumnRoles::detect(&t.dataset);
                let (strategy, text) = analyze_table(&StrategyInput {
                    ds: &t.dataset,
                    roles: &roles,
                    signals: &signals,
                    top_n: self.cfg.top_n,
                });
                debug!(label = %t.label, ?strategy, "table analyzed");
                format!("**{}:**\n{}", t.label, text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Prefixes the model answer with an explicit notice for every empty table.
fn with_empty_notices(tables: &[LabeledTable], answer: String) -> String {
    let notices: Vec<String> = tables
        .iter()
        .filter(|t| t.dataset.is_empty())
        .map(|t| format!("**{}:**\n{}", t.label, empty_sheet(&t.dataset)))
        .collect();
    if notices.is_empty() {
        return answer;
    }
    format!("{}\n\n{answer}", notices.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, TabularDataset};
    use llm_gateway::LlmError;
    use llm_gateway::generator::GenerateFuture;
    use std::sync::Mutex;

    /// Replays canned replies and records prompts.
    struct Scripted {
        reply: std::result::Result<&'static str, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                prompts: Mutex::new(Vec::new()),
            })
        }
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl TextGenerator for Scripted {
        fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
            if let Ok(mut p) = self.prompts.lock() {
                p.push(prompt.to_string());
            }
            let reply = self.reply;
            Box::pin(async move {
                match reply {
                    Ok(s) => Ok::<_, LlmError>(s.to_string()),
                    Err(()) => Err(LlmError::Timeout(std::time::Duration::from_secs(60))),
                }
            })
        }
    }

    fn table(label: &str, header: &[&str], rows: &[&[&str]]) -> LabeledTable {
        LabeledTable {
            label: label.into(),
            dataset: Arc::new(TabularDataset::new(
                label,
                header.iter().map(|s| s.to_string()).collect(),
                rows.iter()
                    .map(|r| r.iter().map(|c| Cell::infer(c)).collect())
                    .collect(),
            )),
        }
    }

    fn heuristic_only() -> TabularReasoner {
        TabularReasoner::new(None, ReasonerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn no_tables_is_no_data() {
        let gen_ = Scripted::ok("should not be called");
        let r = TabularReasoner::new(Some(gen_.clone()), ReasonerConfig::default()).unwrap();
        let out = r.analyze("anything", &[]).await;
        assert_eq!(out.analysis_type, AnalysisType::NoData);
        assert_eq!(out.answer, NO_DATA_ANSWER);
        assert!(out.tables_used.is_empty());
        assert!(gen_.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_table_is_reported_not_aggregated() {
        let t = table("t", &["Region", "Sales"], &[]);
        let out = heuristic_only().analyze("average sales by region", &[t]).await;
        assert_eq!(out.analysis_type, AnalysisType::Heuristic);
        assert!(out.answer.to_lowercase().contains("empty sheet"), "{}", out.answer);
        assert!(!out.answer.contains("NaN"));
        assert_eq!(out.previews.len(), 1);
        assert!(out.previews[0].starts_with("t (shape: 0 rows x 2 columns):"));
    }

    #[tokio::test]
    async fn empty_tables_never_reach_the_model() {
        let t = table("t", &["Region", "Sales"], &[]);
        let g = Scripted::ok("Total sales by region: North 0, South 0.");
        let r = TabularReasoner::new(Some(g.clone()), ReasonerConfig::default()).unwrap();
        let out = r.analyze("total sales by region", &[t]).await;

        assert_eq!(out.analysis_type, AnalysisType::Heuristic);
        assert!(out.answer.contains("empty sheet"), "{}", out.answer);
        assert!(!out.answer.contains("North 0"));
        assert!(g.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_table_is_flagged_next_to_model_answer() {
        let empty = table("empty.csv", &["Region", "Sales"], &[]);
        let full = table("a.csv", &["Region", "Sales"], &[&["North", "100"]]);
        let g = Scripted::ok("North sold 100.");
        let r = TabularReasoner::new(Some(g.clone()), ReasonerConfig::default()).unwrap();
        let out = r.analyze("total sales by region", &[empty, full]).await;

        assert_eq!(out.analysis_type, AnalysisType::LlmTabular);
        assert!(out.answer.starts_with("**empty.csv:**\nData status: empty sheet"));
        assert!(out.answer.ends_with("\n\nNorth sold 100."));
        let prompts = g.prompts.lock().unwrap();
        assert!(prompts[0].contains("Data status: empty sheet, no data rows."));
    }

    #[tokio::test]
    async fn asia_count_under_fallback() {
        let t = table(
            "countries.csv",
            &["Region", "Country"],
            &[&["Asia", "India"], &["Asia", "China"], &["Europe", "Germany"]],
        );
        let failing = Scripted::failing();
        let r = TabularReasoner::new(Some(failing.clone()), ReasonerConfig::default()).unwrap();
        let out = r.analyze("how many countries are in Asia?", &[t]).await;

        assert_eq!(out.analysis_type, AnalysisType::Heuristic);
        assert!(out.answer.starts_with("**countries.csv:**\n"));
        assert!(out.answer.contains("**2**"));
        assert!(out.answer.contains("India, China"));
        assert!(out.diagnostic.as_deref().is_some_and(|d| d.contains("timed out")));
        assert_eq!(failing.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn group_by_ordering_across_tables() {
        let a = table(
            "a.csv",
            &["Region", "Sales"],
            &[&["North", "100"], &["South", "200"], &["North", "50"]],
        );
        let b = table("b.csv", &["Note"], &[&["x"]]);
        let out = heuristic_only().analyze("total sales by region", &[a, b]).await;

        assert_eq!(out.tables_used, vec!["a.csv", "b.csv"]);
        let south = out.answer.find("South: 200").unwrap();
        let north = out.answer.find("North: 150").unwrap();
        assert!(south < north);
        assert!(out.answer.contains("\n\n**b.csv:**\n"));
        assert_eq!(out.diagnostic, None);
    }

    #[tokio::test]
    async fn model_answer_wins_when_available() {
        let t = table("a.csv", &["Region", "Sales"], &[&["North", "100"]]);
        let g = Scripted::ok("  North sold 100.  ");
        let r = TabularReasoner::new(Some(g.clone()), ReasonerConfig::default()).unwrap();
        let out = r.analyze("total sales?", &[t]).await;

        assert_eq!(out.analysis_type, AnalysisType::LlmTabular);
        assert_eq!(out.answer, "North sold 100.");
        let prompts = g.prompts.lock().unwrap();
        assert!(prompts[0].contains("TABLE: a.csv"));
        assert!(prompts[0].contains("USER QUESTION: total sales?"));
    }

    #[tokio::test]
    async fn blank_model_output_falls_back() {
        let t = table("a.csv", &["Region", "Sales"], &[&["North", "100"]]);
        let r = TabularReasoner::new(Some(Scripted::ok("   ")), ReasonerConfig::default()).unwrap();
        let out = r.analyze("total sales by region", &[t]).await;
        assert_eq!(out.analysis_type, AnalysisType::Heuristic);
        assert!(out.diagnostic.is_some());
    }

    #[tokio::test]
    async fn disabled_tier_a_never_prompts() {
        let t = table("a.csv", &["Region", "Sales"], &[&["North", "100"]]);
        let g = Scripted::ok("unused");
        let cfg = ReasonerConfig {
            llm_enabled: false,
            ..ReasonerConfig::default()
        };
        let out = TabularReasoner::new(Some(g.clone()), cfg)
            .unwrap()
            .analyze("total sales", &[t])
            .await;
        assert_eq!(out.analysis_type, AnalysisType::Heuristic);
        assert!(g.prompts.lock().unwrap().is_empty());
    }
}
