use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use legaltune_agent::{replies, AgentRuntime, DocumentAnalysis};
use legaltune_core::config::{AnalysisMode, AppConfig};
use legaltune_documents::{DocumentExtractor, TesseractOcr};

use super::{block_on, llm_gateway, load_config, CommandResult, EXIT_DOCUMENT, EXIT_IO, EXIT_LLM};

/// Runs a local file through the upload pipeline. `mode` overrides
/// `documents.analysis_mode`.
pub fn run(path: &Path, mode: Option<AnalysisMode>) -> CommandResult {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "io",
                format!("failed to read {}: {error}", path.display()),
                EXIT_IO,
            )
        }
    };
    let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();

    let config = match load_config("analyze") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let analysis = DocumentAnalysis::from(mode.unwrap_or(config.documents.analysis_mode));
    let runtime = match build_runtime(&config, analysis) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("analyze", "llm_setup", format!("{error:#}"), EXIT_LLM)
        }
    };

    let reply = match block_on("analyze", runtime.analyze_document(&bytes, &file_name, None)) {
        Ok(Ok(reply)) => reply,
        Ok(Err(error)) => {
            return CommandResult::failure("analyze", error.class(), error.to_string(), EXIT_DOCUMENT)
        }
        Err(result) => return result,
    };

    if reply.text == replies::UNSUPPORTED_FILE {
        return CommandResult::failure("analyze", "unsupported_document", reply.text, EXIT_DOCUMENT);
    }
    if reply.text == replies::UNREADABLE_FILE {
        return CommandResult::failure("analyze", "unreadable_document", reply.text, EXIT_DOCUMENT);
    }
    CommandResult::success("analyze", reply.follow_up.unwrap_or(reply.text))
}

fn build_runtime(config: &AppConfig, analysis: DocumentAnalysis) -> anyhow::Result<AgentRuntime> {
    let gateway = llm_gateway(config)?;
    let extractor = DocumentExtractor::new(Arc::new(TesseractOcr::discover(config.documents.ocr_binary.clone())));
    AgentRuntime::new(gateway, extractor, analysis).context("prompt templates failed to load")
}
