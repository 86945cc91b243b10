//! Prompt templates for every LLM call the bot makes.
//!
//! Templates are embedded at compile time and rendered with Tera. Template
//! names carry a `.txt` suffix so Tera never HTML-escapes user text.

use legaltune_core::config::AnalysisMode;
use tera::{Context, Tera};
use thiserror::Error;

pub const EXPLAIN_LAW_TEMPLATE: &str = "explain_law.txt";
pub const CASE_ASSIST_TEMPLATE: &str = "case_assist.txt";
pub const DOCUMENT_SUMMARY_TEMPLATE: &str = "document_summary.txt";
pub const DOCUMENT_STRATEGIC_TEMPLATE: &str = "document_strategic.txt";

pub const SUMMARY_CONTENT_LIMIT: usize = 50_000;
pub const STRATEGIC_CONTENT_LIMIT: usize = 90_000;

pub const FAQ_PREFIX: &str = "Answer this Legal FAQ briefly: ";
pub const CASE_DOCUMENT_TYPE: &str = "Case Document";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to load template `{name}`: {reason}")]
    Load { name: &'static str, reason: String },
    #[error("failed to render template `{name}`: {reason}")]
    Render { name: &'static str, reason: String },
}

/// Depth of the analysis requested for an uploaded document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocumentAnalysis {
    Summary,
    #[default]
    Strategic,
}

impl DocumentAnalysis {
    pub fn template(self) -> &'static str {
        match self {
            Self::Summary => DOCUMENT_SUMMARY_TEMPLATE,
            Self::Strategic => DOCUMENT_STRATEGIC_TEMPLATE,
        }
    }

    /// Maximum number of characters of extracted text embedded in the prompt.
    pub fn content_limit(self) -> usize {
        match self {
            Self::Summary => SUMMARY_CONTENT_LIMIT,
            Self::Strategic => STRATEGIC_CONTENT_LIMIT,
        }
    }
}

impl From<AnalysisMode> for DocumentAnalysis {
    fn from(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Summary => Self::Summary,
            AnalysisMode::Strategic => Self::Strategic,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        let templates = [
            (EXPLAIN_LAW_TEMPLATE, include_str!("../../../templates/prompts/explain_law.txt")),
            (CASE_ASSIST_TEMPLATE, include_str!("../../../templates/prompts/case_assist.txt")),
            (
                DOCUMENT_SUMMARY_TEMPLATE,
                include_str!("../../../templates/prompts/document_summary.txt"),
            ),
            (
                DOCUMENT_STRATEGIC_TEMPLATE,
                include_str!("../../../templates/prompts/document_strategic.txt"),
            ),
        ];
        for (name, source) in templates {
            tera.add_raw_template(name, source)
                .map_err(|error| PromptError::Load { name, reason: error.to_string() })?;
        }
        tera.autoescape_on(Vec::new());

        Ok(Self { tera })
    }

    pub fn explain_law(&self, query: &str) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("query", query);
        self.render(EXPLAIN_LAW_TEMPLATE, &context)
    }

    pub fn faq(&self, question: &str) -> Result<String, PromptError> {
        self.explain_law(&format!("{FAQ_PREFIX}{question}"))
    }

    pub fn case_assist(&self, query: &str) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("query", query);
        self.render(CASE_ASSIST_TEMPLATE, &context)
    }

    pub fn document_analysis(
        &self,
        analysis: DocumentAnalysis,
        content: &str,
        doc_type: &str,
    ) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("doc_type", doc_type);
        context.insert("content", truncate_chars(content, analysis.content_limit()));
        self.render(analysis.template(), &context)
    }

    fn render(&self, name: &'static str, context: &Context) -> Result<String, PromptError> {
        self.tera
            .render(name, context)
            .map_err(|error| PromptError::Render { name, reason: error.to_string() })
    }
}

/// Longest prefix of `text` holding at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::{truncate_chars, DocumentAnalysis, PromptBuilder, STRATEGIC_CONTENT_LIMIT};

    fn builder() -> PromptBuilder {
        PromptBuilder::new().expect("embedded templates should load")
    }

    #[test]
    fn explanation_prompt_wraps_query() {
        let prompt = builder().explain_law("IPC 420").expect("render");

        assert_eq!(
            prompt,
            "User Query: IPC 420\n\nExplain this law or legal concept in simple terms."
        );
    }

    #[test]
    fn faq_prompt_prefixes_question() {
        let prompt = builder().faq("Is bail a right?").expect("render");

        assert!(prompt.starts_with("User Query: Answer this Legal FAQ briefly: Is bail a right?"));
    }

    #[test]
    fn user_text_is_not_html_escaped() {
        let prompt = builder().case_assist("Tenant & landlord <dispute>").expect("render");

        assert!(prompt.contains("\"Tenant & landlord <dispute>\""));
        assert!(prompt.contains("4. Evidence that should be gathered."));
        assert!(prompt.contains("Keep it practical and actionable."));
    }

    #[test]
    fn summary_and_strategic_templates_stay_distinct() {
        let builder = builder();

        let summary = builder
            .document_analysis(DocumentAnalysis::Summary, "FIR registered", "Case Document")
            .expect("render");
        let strategic = builder
            .document_analysis(DocumentAnalysis::Strategic, "FIR registered", "Case Document")
            .expect("render");

        assert!(summary.contains("(Type: Case Document)"));
        assert!(summary.contains("under 3500 characters"));
        assert!(summary.contains("5. **Key Evidence/Points**"));
        assert!(!summary.contains("6. "));
        assert!(strategic.contains("4. **Strengths**"));
        assert!(strategic.contains("6. **Recommended Next Steps**"));
    }

    #[test]
    fn document_content_is_truncated_by_characters() {
        let content = "अ".repeat(STRATEGIC_CONTENT_LIMIT + 25);

        let prompt = builder()
            .document_analysis(DocumentAnalysis::Strategic, &content, "Case Document")
            .expect("render");

        assert_eq!(prompt.matches('अ').count(), STRATEGIC_CONTENT_LIMIT);
    }

    #[test]
    fn truncation_keeps_short_text_whole() {
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
