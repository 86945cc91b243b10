use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("tesseract binary was not found on PATH")]
    BinaryNotFound,
    #[error("ocr i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("tesseract exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Recognizes text in a PNG-encoded image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_png: &[u8]) -> Result<String, OcrError>;
}

/// Shells out to the `tesseract` CLI. A missing binary is tolerated at
/// startup and reported per call.
#[derive(Clone, Debug, Default)]
pub struct TesseractOcr {
    binary: Option<PathBuf>,
}

impl TesseractOcr {
    /// Uses `configured` when given, otherwise looks `tesseract` up on PATH.
    pub fn discover(configured: Option<PathBuf>) -> Self {
        let binary = configured.or_else(|| which::which("tesseract").ok());
        debug!(binary = ?binary, "resolved tesseract binary");
        Self { binary }
    }

    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image_png: &[u8]) -> Result<String, OcrError> {
        let binary = self.binary.as_ref().ok_or(OcrError::BinaryNotFound)?;

        let owned = image_png.to_vec();
        let input = tokio::task::spawn_blocking(move || write_input(&owned))
            .await
            .map_err(std::io::Error::other)??;

        let output = Command::new(binary).arg(input.path()).arg("stdout").output().await?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Tesseract reads its input from disk. The file lives until the handle drops.
fn write_input(image_png: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut input = tempfile::Builder::new().prefix("legaltune-ocr-").suffix(".png").tempfile()?;
    input.write_all(image_png)?;
    input.flush()?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{write_input, OcrEngine, OcrError, TesseractOcr};

    #[test]
    fn configured_binary_wins_over_path_lookup() {
        let ocr = TesseractOcr::discover(Some(PathBuf::from("/opt/ocr/bin/tesseract")));

        assert_eq!(ocr.binary(), Some(std::path::Path::new("/opt/ocr/bin/tesseract")));
    }

    #[tokio::test]
    async fn missing_binary_is_reported_per_call() {
        let ocr = TesseractOcr::default();

        let result = ocr.recognize(&[0x89, b'P', b'N', b'G']).await;

        assert!(matches!(result, Err(OcrError::BinaryNotFound)));
    }

    #[tokio::test]
    async fn unrunnable_binary_surfaces_io_error() {
        let ocr = TesseractOcr::discover(Some(PathBuf::from("/nonexistent/legaltune/tesseract")));

        let result = ocr.recognize(&[0x89, b'P', b'N', b'G']).await;

        assert!(matches!(result, Err(OcrError::Io(_))));
    }

    #[test]
    fn input_image_is_staged_as_png_file() {
        let staged = write_input(b"png-bytes").expect("stage input");

        assert_eq!(staged.path().extension().and_then(|ext| ext.to_str()), Some("png"));
        assert_eq!(std::fs::read(staged.path()).expect("read back"), b"png-bytes");
    }
}
