//! Fixed texts sent back to users.

use legaltune_core::Intent;

pub const DISCLAIMER: &str =
    "\n\n⚠️ *Disclaimer*: This is legal information, not legal advice. Consult a licensed lawyer.";

pub const HELP: &str = "*User Guide*\nUse the buttons or type natural queries like 'Explain IPC 302' or 'Help with my case'.";

pub const FAQ: &str = "*Legal FAQ* ❓\n\n1. Is this advice? No.\n2. Predictions? No.";

pub const PRIVACY_POLICY: &str = "🔒 *Privacy Policy – Legal Tune Bot*

We respect your privacy and are committed to protecting your data.

*1. Data Collection*
We do NOT store personal information
Messages are processed only to generate responses
Uploaded files are used temporarily for analysis and are not saved

*2. Use of Information*
Information is used only to explain laws and legal procedures
No data is shared with third parties

*3. AI Usage*
This bot uses AI to provide legal information
AI responses are informational only, not legal advice

*4. Data Security*
We do not maintain databases of user conversations
Temporary processing is done securely

*5. Legal Disclaimer*
This bot provides legal information, not legal advice.
Always consult a licensed lawyer for legal matters.

*6. Policy Updates*
This privacy policy may be updated without prior notice.";

pub const LAW_USAGE: &str = "Usage: /law <name>";
pub const CASE_UPLOAD_REQUEST: &str = "Please upload your document.";
pub const LANGUAGE_REQUEST: &str = "Type your language name now.";

pub const ANALYSIS_COMPLETE: &str = "Analysis Complete. Summary below:";
pub const UNREADABLE_FILE: &str = "⚠️ Could not extract text. File might be empty/unreadable.";
pub const UNSUPPORTED_FILE: &str =
    "⚠️ Unsupported file format. Please upload a PDF, DOCX, TXT, JPG or PNG file.";
pub const UNKNOWN_SELECTION: &str = "⚠️ That option is no longer available. Use /start to open the menu again.";

pub fn welcome(first_name: Option<&str>) -> String {
    let name = first_name.map(str::trim).filter(|name| !name.is_empty()).unwrap_or("there");
    format!(
        "Hello {name}! 👋\n\n\
         I am your *Legal Information Assistant*. 🤖\n\
         I can help you with:\n\
         🔹 Explaining Laws\n\
         🔹 Analyzing Case Files\n\
         🔹 Case Strategy Assistance\n\n\
         _I do NOT provide legal advice._\n\n\
         Select an option or just type your question:"
    )
}

pub fn language_confirmation(language: &str) -> String {
    format!("✅ Language set to: {language}. I will try to answer in {language} from now on.")
}

/// Instruction shown after a menu selection.
pub fn selection_instruction(intent: Intent) -> &'static str {
    match intent {
        Intent::ExplainLaw => {
            "Use /law <name> or just type the law name here (e.g. 'IPC 420')."
        }
        Intent::UploadCase => "Please upload your case document (PDF, DOCX, or Image) now.",
        Intent::CaseAssist => {
            "I can help analyze your case strategy. Briefly describe your situation or ask 'How can I strengthen my case?'."
        }
        Intent::ChangeLanguage => "Please type your preferred language (e.g. 'Hindi', 'Telugu').",
        Intent::Faq => "Ask me a short legal question, or type 'FAQ' to see common ones.",
        Intent::Privacy => PRIVACY_POLICY,
        Intent::GeneralQuery => "Type your legal question and I will explain it in simple terms.",
    }
}
