//! Grounded answer prompt: fixed preamble, numbered contexts, question.

use crate::context::ContextBlock;

pub const PREAMBLE: &str = "You are a helpful assistant. Answer using ONLY the provided context.\n\
If the answer isn't in the context, say you don't know.\n\
Cite sources with page/sheet info if present.\n";

/// Block headers read `[i] <source>` plus ` (page N)` / ` (sheet S)` when
/// the context carries that hint.
pub fn build_grounded_prompt(question: &str, contexts: &[ContextBlock]) -> String {
    let blocks: Vec<String> = contexts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let loc = c
                .location
                .as_ref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default();
            format!("[{}] {}{}\n{}\n", i + 1, c.source_label, loc, c.text.trim())
        })
        .collect();
    format!(
        "{PREAMBLE}\nContext:\n{}\nQuestion: {}\nAnswer:",
        blocks.join("\n"),
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LocationHint;

    #[test]
    fn numbered_blocks_with_hints() {
        let ctx = vec![
            ContextBlock {
                text: "Revenue grew 4%.".into(),
                source_label: "report.pdf".into(),
                location: Some(LocationHint::Page(2)),
            },
            ContextBlock {
                text: "See you Friday".into(),
                source_label: "Offsite".into(),
                location: None,
            },
        ];
        let p = build_grounded_prompt("How much did revenue grow?", &ctx);
        assert!(p.starts_with(PREAMBLE));
        assert!(p.contains("[1] report.pdf (page 2)\nRevenue grew 4%.\n"));
        assert!(p.contains("[2] Offsite\nSee you Friday\n"));
        assert!(p.ends_with("Question: How much did revenue grow?\nAnswer:"));
    }

    #[test]
    fn empty_contexts_still_build() {
        let p = build_grounded_prompt("q", &[]);
        assert!(p.contains("Context:\n\nQuestion: q"));
    }
}
