use legaltune_agent::classify;

use super::CommandResult;

/// Classifies `text` as a fresh message with no pending menu selection.
pub fn run(text: &str) -> CommandResult {
    let classification = classify(text, None);
    CommandResult::success("classify", classification.intent.as_str())
}
