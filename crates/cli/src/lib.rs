pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use legaltune_core::config::AnalysisMode;

#[derive(Debug, Parser)]
#[command(
    name = "legaltune",
    about = "Legal Tune operator CLI",
    long_about = "Inspect configuration, check readiness, and exercise the classifier, LLM gateway and document analysis without Telegram.",
    after_help = "Examples:\n  legaltune doctor --json\n  legaltune config\n  legaltune classify \"what is IPC section 420\"\n  legaltune analyze notice.pdf --mode summary"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config, OCR binary availability, and LLM credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the intent a chat message would be routed to")]
    Classify {
        #[arg(required = true, help = "Message text")]
        text: Vec<String>,
    },
    #[command(about = "Send one prompt through the LLM gateway and print the answer")]
    Ask {
        #[arg(required = true, help = "Prompt text")]
        prompt: Vec<String>,
        #[arg(long, help = "Ask for the answer in this language")]
        language: Option<String>,
    },
    #[command(about = "Extract a local PDF, DOCX or image and print its analysis")]
    Analyze {
        file: PathBuf,
        #[arg(long, help = "summary or strategic; defaults to documents.analysis_mode")]
        mode: Option<AnalysisMode>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::CommandResult { exit_code: 0, output: commands::config::run() },
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Classify { text } => commands::classify::run(&text.join(" ")),
        Command::Ask { prompt, language } => commands::ask::run(&prompt.join(" "), language.as_deref()),
        Command::Analyze { file, mode } => commands::analyze::run(&file, mode),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
