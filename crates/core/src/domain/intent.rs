use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a user is trying to do with a message.
///
/// Produced either by the keyword classifier or by an explicit menu selection
/// that applies to the next text message only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ExplainLaw,
    UploadCase,
    CaseAssist,
    ChangeLanguage,
    Faq,
    Privacy,
    GeneralQuery,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown intent selection `{0}`")]
pub struct UnknownIntent(pub String);

impl Intent {
    /// Intents offered on the main menu, in display order.
    pub const MENU: [Intent; 6] = [
        Intent::ExplainLaw,
        Intent::UploadCase,
        Intent::CaseAssist,
        Intent::ChangeLanguage,
        Intent::Faq,
        Intent::Privacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplainLaw => "explain_law",
            Self::UploadCase => "upload_case",
            Self::CaseAssist => "case_assist",
            Self::ChangeLanguage => "change_lang",
            Self::Faq => "faq",
            Self::Privacy => "privacy",
            Self::GeneralQuery => "general_query",
        }
    }

    /// Payload carried by the menu button for this intent.
    pub fn callback_data(&self) -> String {
        format!("intent_{}", self.as_str())
    }

    pub fn from_callback_data(data: &str) -> Result<Self, UnknownIntent> {
        data.trim()
            .strip_prefix("intent_")
            .ok_or_else(|| UnknownIntent(data.to_owned()))?
            .parse()
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            Self::ExplainLaw => "📘 Explain a Law",
            Self::UploadCase => "📂 Upload Case File",
            Self::CaseAssist => "⚖️ Case Assistance",
            Self::ChangeLanguage => "🌐 Change Language",
            Self::Faq => "❓ Legal FAQ",
            Self::Privacy => "🔒 Privacy Policy",
            Self::GeneralQuery => "💬 Ask a Question",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "explain_law" => Ok(Self::ExplainLaw),
            "upload_case" => Ok(Self::UploadCase),
            "case_assist" => Ok(Self::CaseAssist),
            "change_lang" | "change_language" => Ok(Self::ChangeLanguage),
            "faq" => Ok(Self::Faq),
            "privacy" => Ok(Self::Privacy),
            "general_query" => Ok(Self::GeneralQuery),
            _ => Err(UnknownIntent(value.to_owned())),
        }
    }
}
