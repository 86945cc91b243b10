use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::DocumentError;

const BODY_PART: &str = "word/document.xml";

/// Paragraph texts of the main document part, joined with newlines.
pub fn extract_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|error| DocumentError::Word(error.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(BODY_PART)
        .map_err(|error| DocumentError::Word(format!("{BODY_PART}: {error}")))?
        .read_to_string(&mut xml)
        .map_err(|error| DocumentError::Word(error.to_string()))?;

    paragraphs_from_xml(&xml)
}

pub(crate) fn paragraphs_from_xml(xml: &str) -> Result<String, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                if element.name().as_ref() == b"w:t" {
                    in_text_run = true;
                }
            }
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(element)) => match element.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text_run => {
                let unescaped =
                    text.unescape().map_err(|error| DocumentError::Word(error.to_string()))?;
                current.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                return Err(DocumentError::Word(format!(
                    "malformed xml at byte {}: {error}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}
