use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    pub documents: DocumentsConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub api_base_url: String,
    pub poll_timeout_secs: u32,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DocumentsConfig {
    pub analysis_mode: AnalysisMode,
    pub ocr_binary: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Zero keeps sessions for the whole process lifetime.
    pub idle_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Which document-analysis prompt an uploaded file goes through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Five-section digest of at most 50,000 input characters.
    Summary,
    /// Six-section review including strengths, weaknesses and next steps,
    /// over at most 90,000 input characters.
    #[default]
    Strategic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub telegram_bot_token: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub analysis_mode: Option<AnalysisMode>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["legaltune.toml", "config/legaltune.toml"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                api_base_url: "https://api.telegram.org".to_string(),
                poll_timeout_secs: 30,
            },
            llm: LlmConfig {
                api_key: String::new().into(),
                base_url: "https://generativelanguage.googleapis.com/v1".to_string(),
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: 30,
                max_attempts: 3,
                initial_backoff_secs: 2,
            },
            documents: DocumentsConfig { analysis_mode: AnalysisMode::Strategic, ocr_binary: None },
            session: SessionConfig { idle_ttl_secs: 0 },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), health_check_port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for AnalysisMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "strategic" => Ok(Self::Strategic),
            other => Err(ConfigError::Validation(format!(
                "unsupported analysis mode `{other}` (expected summary|strategic)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telegram) = patch.telegram {
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token_value);
            }
            if let Some(api_base_url) = telegram.api_base_url {
                self.telegram.api_base_url = api_base_url;
            }
            if let Some(poll_timeout_secs) = telegram.poll_timeout_secs {
                self.telegram.poll_timeout_secs = poll_timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_attempts) = llm.max_attempts {
                self.llm.max_attempts = max_attempts;
            }
            if let Some(initial_backoff_secs) = llm.initial_backoff_secs {
                self.llm.initial_backoff_secs = initial_backoff_secs;
            }
        }

        if let Some(documents) = patch.documents {
            if let Some(analysis_mode) = documents.analysis_mode {
                self.documents.analysis_mode = analysis_mode;
            }
            if let Some(ocr_binary) = documents.ocr_binary {
                self.documents.ocr_binary = Some(ocr_binary);
            }
        }

        if let Some(session) = patch.session {
            if let Some(idle_ttl_secs) = session.idle_ttl_secs {
                self.session.idle_ttl_secs = idle_ttl_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let bot_token = read_env("LEGALTUNE_TELEGRAM_BOT_TOKEN")
            .or_else(|| read_env("TELEGRAM_BOT_TOKEN"));
        if let Some(value) = bot_token {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("LEGALTUNE_TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = value;
        }
        if let Some(value) = read_env("LEGALTUNE_TELEGRAM_POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs =
                parse_u32("LEGALTUNE_TELEGRAM_POLL_TIMEOUT_SECS", &value)?;
        }

        let api_key = read_env("LEGALTUNE_LLM_API_KEY").or_else(|| read_env("GEMINI_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = secret_value(value);
        }
        if let Some(value) = read_env("LEGALTUNE_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("LEGALTUNE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("LEGALTUNE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("LEGALTUNE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("LEGALTUNE_LLM_MAX_ATTEMPTS") {
            self.llm.max_attempts = parse_u32("LEGALTUNE_LLM_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("LEGALTUNE_LLM_INITIAL_BACKOFF_SECS") {
            self.llm.initial_backoff_secs =
                parse_u64("LEGALTUNE_LLM_INITIAL_BACKOFF_SECS", &value)?;
        }

        if let Some(value) = read_env("LEGALTUNE_DOCUMENTS_ANALYSIS_MODE") {
            self.documents.analysis_mode = value.parse()?;
        }
        if let Some(value) = read_env("LEGALTUNE_DOCUMENTS_OCR_BINARY") {
            self.documents.ocr_binary = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("LEGALTUNE_SESSION_IDLE_TTL_SECS") {
            self.session.idle_ttl_secs = parse_u64("LEGALTUNE_SESSION_IDLE_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("LEGALTUNE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("LEGALTUNE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("LEGALTUNE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("LEGALTUNE_LOGGING_LEVEL").or_else(|| read_env("LEGALTUNE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LEGALTUNE_LOGGING_FORMAT").or_else(|| read_env("LEGALTUNE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(analysis_mode) = overrides.analysis_mode {
            self.documents.analysis_mode = analysis_mode;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_telegram(&self.telegram)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Set TELEGRAM_BOT_TOKEN with the token issued by @BotFather"
                .to_string(),
        ));
    }

    let well_formed = bot_token
        .split_once(':')
        .map(|(bot_id, secret)| {
            !bot_id.is_empty() && bot_id.chars().all(|ch| ch.is_ascii_digit()) && !secret.is_empty()
        })
        .unwrap_or(false);
    if !well_formed {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<bot id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if !telegram.api_base_url.starts_with("http://")
        && !telegram.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "telegram.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if telegram.poll_timeout_secs > 50 {
        return Err(ConfigError::Validation(
            "telegram.poll_timeout_secs must be in range 0..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.api_key is required. Set GEMINI_API_KEY with a Generative Language API key"
                .to_string(),
        ));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_attempts == 0 || llm.max_attempts > 10 {
        return Err(ConfigError::Validation(
            "llm.max_attempts must be in range 1..=10".to_string(),
        ));
    }

    if llm.initial_backoff_secs > 60 {
        return Err(ConfigError::Validation(
            "llm.initial_backoff_secs must be in range 0..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    telegram: Option<TelegramPatch>,
    llm: Option<LlmPatch>,
    documents: Option<DocumentsPatch>,
    session: Option<SessionPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    api_base_url: Option<String>,
    poll_timeout_secs: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    initial_backoff_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    analysis_mode: Option<AnalysisMode>,
    ocr_binary: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    idle_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
