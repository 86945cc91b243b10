use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use legaltune_agent::{
    AgentRuntime, DocumentAnalysis, GeminiClient, LlmFailure, LlmGateway, PromptError, RetryPolicy,
    SessionStore,
};
use legaltune_core::config::{AppConfig, ConfigError};
use legaltune_documents::{DocumentExtractor, TesseractOcr};
use legaltune_telegram::{BotApi, PollingRunner, ReconnectPolicy, TransportError, UpdateDispatcher};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bridge::RuntimeChatService;

pub const TRANSPORT_MODE: &str = "long_polling";

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
    pub sessions: Arc<SessionStore>,
    pub polling_runner: PollingRunner,
    pub ocr_binary: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("prompt templates failed to load: {0}")]
    Prompt(#[from] PromptError),
    #[error("llm client setup failed: {0}")]
    Llm(#[source] LlmFailure),
    #[error("telegram client setup failed: {0}")]
    Transport(#[source] TransportError),
}

/// Wires the OCR engine, LLM gateway, agent runtime and Telegram polling
/// runner from an already loaded config.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", correlation_id = "bootstrap", "starting application bootstrap");
    config.validate()?;

    let ocr = TesseractOcr::discover(config.documents.ocr_binary.clone());
    let ocr_binary = ocr.binary().map(PathBuf::from);
    match &ocr_binary {
        Some(binary) => info!(
            event_name = "system.bootstrap.ocr_ready",
            correlation_id = "bootstrap",
            binary = %binary.display(),
            "ocr engine resolved"
        ),
        None => warn!(
            event_name = "system.bootstrap.ocr_missing",
            correlation_id = "bootstrap",
            "tesseract not found; image and scanned pdf uploads will fail"
        ),
    }

    let client = GeminiClient::new(&config.llm).map_err(BootstrapError::Llm)?;
    info!(
        event_name = "system.bootstrap.llm_ready",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        "llm client configured"
    );
    let gateway = LlmGateway::new(Arc::new(client), RetryPolicy::from(&config.llm));

    let sessions = Arc::new(SessionStore::new());
    let analysis = DocumentAnalysis::from(config.documents.analysis_mode);
    let runtime = Arc::new(
        AgentRuntime::new(gateway, DocumentExtractor::new(Arc::new(ocr)), analysis)?
            .with_sessions(Arc::clone(&sessions)),
    );

    let bot = Arc::new(BotApi::new(&config.telegram).map_err(BootstrapError::Transport)?);
    let dispatcher = Arc::new(UpdateDispatcher::new(
        Arc::new(RuntimeChatService::new(Arc::clone(&runtime))),
        bot.clone(),
    ));
    let polling_runner = PollingRunner::new(bot, dispatcher, ReconnectPolicy::default());

    info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        transport_mode = TRANSPORT_MODE,
        analysis_mode = ?analysis,
        "application bootstrap complete"
    );

    Ok(Application { config, runtime, sessions, polling_runner, ocr_binary })
}

/// Periodically evicts idle sessions. Returns `None` when eviction is
/// disabled (`idle_ttl` of zero).
pub fn spawn_session_pruner(sessions: Arc<SessionStore>, idle_ttl: Duration) -> Option<JoinHandle<()>> {
    if idle_ttl.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(idle_ttl);
        loop {
            ticker.tick().await;
            let pruned = sessions.prune_idle(idle_ttl).await;
            if pruned > 0 {
                info!(event_name = "system.session.pruned", pruned, "evicted idle sessions");
            }
        }
    }))
}
