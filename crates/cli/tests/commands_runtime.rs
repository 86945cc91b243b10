use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use legaltune_cli::commands::{analyze, ask, classify, config, doctor};
use legaltune_core::config::AnalysisMode;
use serde_json::Value;

const VALID_ENV: [(&str, &str); 2] =
    [("LEGALTUNE_TELEGRAM_BOT_TOKEN", "123456:test-secret"), ("LEGALTUNE_LLM_API_KEY", "test-key")];

#[test]
fn classify_routes_law_questions() {
    let result = classify::run("What does Section 420 of IPC say?");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "classify");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["message"], "explain_law");
}

#[test]
fn classify_routes_case_help() {
    let payload = parse_payload(&classify::run("how do I defend myself against this charge").output);
    assert_eq!(payload["message"], "case_assist");
}

#[test]
fn ask_returns_config_failure_without_credentials() {
    with_env(&[], || {
        let result = ask::run("what is bail", None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn analyze_reports_missing_file_as_io_error() {
    with_env(&VALID_ENV, || {
        let result = analyze::run(Path::new("/nonexistent/notice.pdf"), None);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "io");
    });
}

#[test]
fn analyze_rejects_unsupported_extension_without_calling_llm() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledger.xlsx");
    fs::write(&path, b"not a document").expect("write fixture");

    with_env(&VALID_ENV, || {
        let result = analyze::run(&path, Some(AnalysisMode::Summary));
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "analyze");
        assert_eq!(payload["error_class"], "unsupported_document");
    });
}

#[test]
fn analyze_flags_text_too_short_to_analyse() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("note.txt");
    fs::write(&path, "FIR").expect("write fixture");

    with_env(&VALID_ENV, || {
        let result = analyze::run(&path, None);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "unreadable_document");
    });
}

#[test]
fn config_redacts_secrets_and_attributes_env_sources() {
    with_env(&[("TELEGRAM_BOT_TOKEN", "987:very-secret"), ("GEMINI_API_KEY", "gemini-secret")], || {
        let output = config::run();

        assert!(output.contains("- telegram.bot_token = 987:*** (source: env (TELEGRAM_BOT_TOKEN))"));
        assert!(output.contains("- llm.api_key = <redacted> (source: env (GEMINI_API_KEY))"));
        assert!(output.contains("- llm.model = gemini-2.5-flash (source: default)"));
        assert!(!output.contains("very-secret"));
        assert!(!output.contains("gemini-secret"));
    });
}

#[test]
fn doctor_json_reports_config_failure() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "LEGALTUNE_TELEGRAM_BOT_TOKEN",
        "TELEGRAM_BOT_TOKEN",
        "LEGALTUNE_TELEGRAM_API_BASE_URL",
        "LEGALTUNE_TELEGRAM_POLL_TIMEOUT_SECS",
        "LEGALTUNE_LLM_API_KEY",
        "GEMINI_API_KEY",
        "LEGALTUNE_LLM_BASE_URL",
        "LEGALTUNE_LLM_MODEL",
        "LEGALTUNE_LLM_TIMEOUT_SECS",
        "LEGALTUNE_LLM_MAX_ATTEMPTS",
        "LEGALTUNE_LLM_INITIAL_BACKOFF_SECS",
        "LEGALTUNE_DOCUMENTS_ANALYSIS_MODE",
        "LEGALTUNE_DOCUMENTS_OCR_BINARY",
        "LEGALTUNE_SESSION_IDLE_TTL_SECS",
        "LEGALTUNE_SERVER_BIND_ADDRESS",
        "LEGALTUNE_SERVER_HEALTH_CHECK_PORT",
        "LEGALTUNE_LOGGING_LEVEL",
        "LEGALTUNE_LOGGING_FORMAT",
        "LEGALTUNE_LOG_LEVEL",
        "LEGALTUNE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
