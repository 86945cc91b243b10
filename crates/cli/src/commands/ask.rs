use legaltune_agent::LlmFailure;

use super::{block_on, llm_gateway, load_config, CommandResult, EXIT_LLM};

/// One prompt through the same retrying gateway the bot uses. Useful as a
/// model availability check.
pub fn run(prompt: &str, language: Option<&str>) -> CommandResult {
    let config = match load_config("ask") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let gateway = match llm_gateway(&config) {
        Ok(gateway) => gateway,
        Err(error) => return CommandResult::failure("ask", "llm_setup", format!("{error:#}"), EXIT_LLM),
    };

    match block_on("ask", gateway.try_generate(prompt, language)) {
        Ok(Ok(answer)) => CommandResult::success("ask", answer),
        Ok(Err(failure)) => CommandResult::failure("ask", failure_class(&failure), failure.to_string(), EXIT_LLM),
        Err(result) => result,
    }
}

fn failure_class(failure: &LlmFailure) -> &'static str {
    match failure {
        LlmFailure::RateLimited => "llm_rate_limited",
        LlmFailure::Malformed(_) | LlmFailure::Empty => "llm_empty_response",
        LlmFailure::Transport(_) | LlmFailure::Upstream { .. } => "llm_unavailable",
    }
}
