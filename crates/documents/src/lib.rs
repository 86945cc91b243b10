//! Document text extraction
//!
//! Turns uploaded case files into plain text for the analysis prompts:
//! - **PDF** (`pdf`) - per-page text via `lopdf`
//! - **Word** (`docx`) - paragraph text from the OOXML package
//! - **Images** (`ocr`) - OCR through a pluggable [`OcrEngine`]
//! - **Plain text** - strict UTF-8
//!
//! Dispatch is purely on the declared file extension. Unknown extensions
//! yield [`UNSUPPORTED_FORMAT`] instead of an error.

pub mod docx;
pub mod ocr;
pub mod pdf;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

pub use ocr::{OcrEngine, OcrError, TesseractOcr};

pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format.";

/// Extractions shorter than this many characters count as unreadable.
pub const MIN_EXTRACTED_CHARS: usize = 10;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("could not read PDF: {0}")]
    Pdf(String),
    #[error("could not read Word document: {0}")]
    Word(String),
    #[error("could not decode image: {0}")]
    Image(String),
    #[error("text file is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Word,
    Image,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    /// Accepts `.pdf` as well as `pdf`, in any case.
    pub fn from_extension(extension: &str) -> Self {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Word,
            "jpg" | "jpeg" | "png" => Self::Image,
            "txt" => Self::PlainText,
            _ => Self::Unsupported,
        }
    }
}

/// Dotted extension of `file_name`, or an empty string when it has none.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default()
}

pub fn has_enough_text(text: &str) -> bool {
    text.chars().count() >= MIN_EXTRACTED_CHARS
}

#[derive(Clone)]
pub struct DocumentExtractor {
    ocr: Arc<dyn OcrEngine>,
}

impl DocumentExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub async fn extract(&self, bytes: &[u8], extension: &str) -> Result<String, DocumentError> {
        let format = DocumentFormat::from_extension(extension);
        debug!(?format, extension, size = bytes.len(), "extracting document text");

        match format {
            DocumentFormat::Pdf => run_blocking(bytes, pdf::extract_text).await,
            DocumentFormat::Word => run_blocking(bytes, docx::extract_text).await,
            DocumentFormat::Image => self.extract_image(bytes).await,
            DocumentFormat::PlainText => String::from_utf8(bytes.to_vec())
                .map_err(|error| DocumentError::Encoding(error.to_string())),
            DocumentFormat::Unsupported => Ok(UNSUPPORTED_FORMAT.to_string()),
        }
    }

    async fn extract_image(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        let png = run_blocking(bytes, normalize_to_png).await?;

        match self.ocr.recognize(&png).await {
            Ok(text) => Ok(text),
            Err(error) => {
                warn!(error = %error, "ocr engine failed");
                Ok(format!("Error using Tesseract OCR: {error}. Ensure Tesseract is installed."))
            }
        }
    }
}

fn normalize_to_png(bytes: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let image =
        image::load_from_memory(bytes).map_err(|error| DocumentError::Image(error.to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|error| DocumentError::Image(error.to_string()))?;
    Ok(png)
}

async fn run_blocking<T, F>(bytes: &[u8], parse: F) -> Result<T, DocumentError>
where
    T: Send + 'static,
    F: FnOnce(&[u8]) -> Result<T, DocumentError> + Send + 'static,
{
    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || parse(&owned))
        .await
        .map_err(|error| DocumentError::Worker(error.to_string()))?
}
