use lopdf::Document;
use tracing::debug;

use crate::DocumentError;

/// Concatenates the text of every page in page order. Pages without
/// extractable text contribute nothing.
pub fn extract_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let document =
        Document::load_mem(bytes).map_err(|error| DocumentError::Pdf(error.to_string()))?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(error) => {
                debug!(page_number, error = %error, "pdf page has no extractable text");
            }
        }
    }

    Ok(text)
}
