//! Word (.docx) extraction.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ooxml::{local_name, OoxmlPackage};
use super::{ExtractionError, FormatExtractor};
use crate::models::{DocumentKind, DocumentMetadata, ExtractedDocument, ExtractionDetail};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts body paragraphs from `word/document.xml`.
pub struct WordExtractor;

impl FormatExtractor for WordExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Word
    }

    fn extract(
        &self,
        path: &Path,
        _detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let mut package = OoxmlPackage::open(path, DocumentKind::Word)?;
        let xml = package.read_part(DOCUMENT_PART)?;
        let paragraphs =
            body_paragraphs(&xml).map_err(|e| package.xml_error(DOCUMENT_PART, e))?;

        Ok(ExtractedDocument::new(
            paragraphs.join("\n"),
            DocumentMetadata::Word {
                paragraph_count: paragraphs.len(),
            },
        ))
    }
}

/// Text of every `w:p` directly under `w:body`, empty paragraphs included.
///
/// Runs nested in text boxes or markup-compatibility fallbacks are skipped
/// so their text isn't duplicated.
fn body_paragraphs(xml: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(e.name().into_inner()).to_vec();
                if name == b"p" && parent_is(&stack, b"body") {
                    current = Some(String::new());
                } else if let Some(text) = current.as_mut() {
                    push_run_break(text, &name, &stack);
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(e.name().into_inner());
                if name == b"p" && parent_is(&stack, b"body") {
                    paragraphs.push(String::new());
                } else if let Some(text) = current.as_mut() {
                    push_run_break(text, name, &stack);
                }
            }
            Event::Text(e) => {
                if let Some(text) = current.as_mut() {
                    if in_run_text(&stack) {
                        text.push_str(&e.unescape()?);
                    }
                }
            }
            Event::CData(e) => {
                if let Some(text) = current.as_mut() {
                    if in_run_text(&stack) {
                        text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                if closed.as_deref() == Some(b"p".as_slice()) && parent_is(&stack, b"body") {
                    if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().is_some_and(|top| top == name)
}

fn is_skipped_container(name: &[u8]) -> bool {
    name == b"txbxContent" || name == b"Fallback"
}

/// Inside a `w:t` that belongs to a `w:r`, outside skipped containers.
fn in_run_text(stack: &[Vec<u8>]) -> bool {
    let n = stack.len();
    n >= 2
        && stack[n - 1] == b"t"
        && stack[n - 2] == b"r"
        && !stack.iter().any(|s| is_skipped_container(s))
}

fn push_run_break(text: &mut String, name: &[u8], stack: &[Vec<u8>]) {
    if !parent_is(stack, b"r") || stack.iter().any(|s| is_skipped_container(s)) {
        return;
    }
    match name {
        b"tab" => text.push('\t'),
        b"br" | b"cr" => text.push('\n'),
        _ => {}
    }
}
