use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use legaltune_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_PATHS};
use secrecy::ExposeSecret;
use toml::Value;

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_key =
        if config.llm.api_key.expose_secret().trim().is_empty() { "<unset>" } else { "<redacted>" };

    vec![
        field(
            "telegram.bot_token",
            &["LEGALTUNE_TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN"],
            redact_token(config.telegram.bot_token.expose_secret()),
        ),
        field(
            "telegram.api_base_url",
            &["LEGALTUNE_TELEGRAM_API_BASE_URL"],
            config.telegram.api_base_url.clone(),
        ),
        field(
            "telegram.poll_timeout_secs",
            &["LEGALTUNE_TELEGRAM_POLL_TIMEOUT_SECS"],
            config.telegram.poll_timeout_secs.to_string(),
        ),
        field("llm.api_key", &["LEGALTUNE_LLM_API_KEY", "GEMINI_API_KEY"], api_key.to_string()),
        field("llm.base_url", &["LEGALTUNE_LLM_BASE_URL"], config.llm.base_url.clone()),
        field("llm.model", &["LEGALTUNE_LLM_MODEL"], config.llm.model.clone()),
        field("llm.timeout_secs", &["LEGALTUNE_LLM_TIMEOUT_SECS"], config.llm.timeout_secs.to_string()),
        field("llm.max_attempts", &["LEGALTUNE_LLM_MAX_ATTEMPTS"], config.llm.max_attempts.to_string()),
        field(
            "llm.initial_backoff_secs",
            &["LEGALTUNE_LLM_INITIAL_BACKOFF_SECS"],
            config.llm.initial_backoff_secs.to_string(),
        ),
        field(
            "documents.analysis_mode",
            &["LEGALTUNE_DOCUMENTS_ANALYSIS_MODE"],
            format!("{:?}", config.documents.analysis_mode),
        ),
        field(
            "documents.ocr_binary",
            &["LEGALTUNE_DOCUMENTS_OCR_BINARY"],
            config
                .documents
                .ocr_binary
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<discover on PATH>".to_string()),
        ),
        field(
            "session.idle_ttl_secs",
            &["LEGALTUNE_SESSION_IDLE_TTL_SECS"],
            config.session.idle_ttl_secs.to_string(),
        ),
        field("server.bind_address", &["LEGALTUNE_SERVER_BIND_ADDRESS"], config.server.bind_address.clone()),
        field(
            "server.health_check_port",
            &["LEGALTUNE_SERVER_HEALTH_CHECK_PORT"],
            config.server.health_check_port.to_string(),
        ),
        field("logging.level", &["LEGALTUNE_LOGGING_LEVEL", "LEGALTUNE_LOG_LEVEL"], config.logging.level.clone()),
        field(
            "logging.format",
            &["LEGALTUNE_LOGGING_FORMAT", "LEGALTUNE_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn field(key: &'static str, env_keys: &'static [&'static str], value: String) -> Field {
    Field { key, env_keys, value }
}

fn detect_config_path() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the public bot id of a `<bot id>:<secret>` token.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((bot_id, _)) = trimmed.split_once(':') {
        return format!("{bot_id}:***");
    }

    "<redacted>".to_string()
}
