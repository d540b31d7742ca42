//! PDF text extraction via pdftotext (Poppler).

use std::path::Path;
use std::process::Command;

use super::{ExtractionError, FormatExtractor};
use crate::models::{DocumentKind, DocumentMetadata, ExtractedDocument, ExtractionDetail};
use crate::utils::{command_stdout, ToolFailure};

/// Page separator emitted by pdftotext.
const FORM_FEED: char = '\x0c';

/// Extracts PDF text with the `pdftotext` tool.
pub struct PdfExtractor {
    binary: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            binary: "pdftotext".to_string(),
        }
    }

    /// Use a different pdftotext binary (name or path).
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    fn run_pdftotext(&self, path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.binary)
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .output();

        command_stdout(output).map_err(|failure| match failure {
            ToolFailure::NotFound => {
                ExtractionError::ToolNotFound(format!("{} (install poppler-utils)", self.binary))
            }
            ToolFailure::Failed(msg) => {
                ExtractionError::corrupt(DocumentKind::Pdf, format!("pdftotext failed: {}", msg))
            }
            ToolFailure::Io(e) => ExtractionError::Io(e),
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatExtractor for PdfExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn extract(
        &self,
        path: &Path,
        _detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let text = self.run_pdftotext(path)?;
        let page_count = count_form_feed_pages(&text);
        Ok(ExtractedDocument::new(
            text,
            DocumentMetadata::Pdf { page_count },
        ))
    }
}

/// Number of form-feed separated segments in pdftotext output.
///
/// pdftotext ends every page with a form feed, so the trailing empty
/// segment is counted too. Empty output is one page.
pub fn count_form_feed_pages(text: &str) -> usize {
    text.split(FORM_FEED).count()
}
