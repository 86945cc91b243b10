use legaltune_core::Intent;

const LAW_KEYWORDS: [&str; 5] = ["section", "ipc", "act", "article", "law"];
const CASE_KEYWORDS: [&str; 6] = ["my case", "help", "win", "defend", "strength", "weakness"];
const LANGUAGE_KEYWORDS: [&str; 6] = ["hindi", "english", "telugu", "tamil", "urdu", "language"];

/// Messages with fewer words than this are treated as short FAQ questions.
const FAQ_WORD_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// Set when the intent came from the session's pending selection, which
    /// the caller must now clear.
    pub consumed_pending: bool,
}

#[derive(Clone, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str, pending: Option<Intent>) -> Classification {
        classify(text, pending)
    }
}

/// Keyword rules are plain substring checks on the lower-cased text, tried in
/// order; "contract" therefore matches the `act` rule.
pub fn classify(text: &str, pending: Option<Intent>) -> Classification {
    if let Some(intent) = pending {
        return Classification { intent, consumed_pending: true };
    }

    Classification { intent: classify_text(text), consumed_pending: false }
}

fn classify_text(text: &str) -> Intent {
    let normalized = text.to_lowercase();

    if contains_any(&normalized, &LAW_KEYWORDS) {
        return Intent::ExplainLaw;
    }
    if contains_any(&normalized, &CASE_KEYWORDS) {
        return Intent::CaseAssist;
    }
    if contains_any(&normalized, &LANGUAGE_KEYWORDS) {
        return Intent::ChangeLanguage;
    }
    if normalized.ends_with('?') || normalized.split_whitespace().count() < FAQ_WORD_LIMIT {
        return Intent::Faq;
    }

    Intent::GeneralQuery
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

#[cfg(test)]
mod tests {
    use legaltune_core::Intent;

    use super::{classify, Classification};

    fn intent_of(text: &str) -> Intent {
        classify(text, None).intent
    }

    #[test]
    fn law_keywords_win_first() {
        assert_eq!(intent_of("What is IPC 420?"), Intent::ExplainLaw);
        assert_eq!(intent_of("explain Article 21"), Intent::ExplainLaw);
        assert_eq!(intent_of("help me with section 302"), Intent::ExplainLaw);
    }

    #[test]
    fn substring_matching_is_preserved() {
        assert_eq!(intent_of("my landlord broke the contract"), Intent::ExplainLaw);
        assert_eq!(intent_of("can I win"), Intent::CaseAssist);
    }

    #[test]
    fn case_keywords_route_to_case_assist() {
        assert_eq!(intent_of("How do I defend myself in court"), Intent::CaseAssist);
        assert_eq!(intent_of("what are the weaknesses in my case"), Intent::CaseAssist);
    }

    #[test]
    fn language_names_route_to_language_change() {
        assert_eq!(intent_of("Hindi"), Intent::ChangeLanguage);
        assert_eq!(intent_of("reply in Telugu please"), Intent::ChangeLanguage);
    }

    #[test]
    fn short_or_question_text_is_faq() {
        assert_eq!(intent_of("ok"), Intent::Faq);
        assert_eq!(intent_of(""), Intent::Faq);
        assert_eq!(
            intent_of("is it true that a tenant can be evicted without any notice from the owner?"),
            Intent::Faq
        );
    }

    #[test]
    fn long_statement_without_keywords_is_general_query() {
        assert_eq!(
            intent_of("my neighbour keeps parking his car in front of our gate every single night"),
            Intent::GeneralQuery
        );
    }

    #[test]
    fn pending_intent_overrides_keywords_and_is_flagged() {
        let classification = classify("IPC 420", Some(Intent::ChangeLanguage));

        assert_eq!(
            classification,
            Classification { intent: Intent::ChangeLanguage, consumed_pending: true }
        );
        assert!(!classify("IPC 420", None).consumed_pending);
    }
}
