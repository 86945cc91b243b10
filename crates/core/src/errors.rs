use thiserror::Error;

/// Failures inside a single request. None of them are fatal to the process;
/// the runtime turns every one into a terminal chat reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("document processing failed: {0}")]
    Document(String),
    #[error("prompt rendering failed: {0}")]
    Prompt(String),
}

impl ApplicationError {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Prompt(_) => "prompt",
        }
    }

    pub fn user_message(&self) -> String {
        format!("⚠️ Error: {self}")
    }
}
