use legaltune_agent::GeminiClient;
use legaltune_core::config::{AppConfig, LoadOptions};
use legaltune_documents::TesseractOcr;
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const CHECKS_AFTER_CONFIG: [&str; 3] = ["telegram_token", "llm_credentials", "ocr_binary"];

pub fn run(json_output: bool) -> String {
    let report = build_report(AppConfig::load(LoadOptions::default()));

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report<E: std::fmt::Display>(loaded: Result<AppConfig, E>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_telegram_token(&config));
            checks.push(check_llm_credentials(&config));
            checks.push(check_ocr_binary(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(CHECKS_AFTER_CONFIG.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_telegram_token(config: &AppConfig) -> DoctorCheck {
    let bot_id = config
        .telegram
        .bot_token
        .expose_secret()
        .split_once(':')
        .map(|(bot_id, _)| bot_id.to_string())
        .unwrap_or_default();
    DoctorCheck {
        name: "telegram_token",
        status: CheckStatus::Pass,
        details: format!("token for bot id {bot_id} against {}", config.telegram.api_base_url),
    }
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    match GeminiClient::new(&config.llm) {
        Ok(client) => DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Pass,
            details: format!("api key present; model endpoint {}", client.endpoint()),
        },
        Err(error) => DoctorCheck {
            name: "llm_credentials",
            status: CheckStatus::Fail,
            details: format!("llm client could not be built: {error}"),
        },
    }
}

fn check_ocr_binary(config: &AppConfig) -> DoctorCheck {
    let ocr = TesseractOcr::discover(config.documents.ocr_binary.clone());
    match ocr.binary() {
        Some(binary) if binary.exists() => DoctorCheck {
            name: "ocr_binary",
            status: CheckStatus::Pass,
            details: format!("tesseract at {}", binary.display()),
        },
        Some(binary) => DoctorCheck {
            name: "ocr_binary",
            status: CheckStatus::Fail,
            details: format!("configured tesseract binary {} does not exist", binary.display()),
        },
        None => DoctorCheck {
            name: "ocr_binary",
            status: CheckStatus::Fail,
            details: "tesseract not found on PATH; image and scanned pdf uploads will fail".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
