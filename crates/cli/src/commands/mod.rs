pub mod analyze;
pub mod ask;
pub mod classify;
pub mod config;
pub mod doctor;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use legaltune_agent::{GeminiClient, LlmGateway, RetryPolicy};
use legaltune_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_IO: u8 = 3;
pub const EXIT_LLM: u8 = 4;
pub const EXIT_DOCUMENT: u8 = 5;
pub const EXIT_RUNTIME: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Runs `future` on a fresh current-thread runtime; the CLI stays sync at
/// its edges.
pub(crate) fn block_on<F: Future>(command: &str, future: F) -> Result<F::Output, CommandResult> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map(|runtime| runtime.block_on(future))
        .map_err(|error| {
            CommandResult::failure(
                command,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub(crate) fn llm_gateway(config: &AppConfig) -> anyhow::Result<LlmGateway> {
    let client = GeminiClient::new(&config.llm).context("llm client setup failed")?;
    Ok(LlmGateway::new(Arc::new(client), RetryPolicy::from(&config.llm)))
}
