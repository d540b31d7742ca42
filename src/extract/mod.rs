//! Document text extraction.
//!
//! Normalizes PDF, Word, spreadsheet, presentation and image files into an
//! [`ExtractedDocument`]:
//! - pdftotext (Poppler) for PDF text
//! - Office Open XML parsing for docx, xlsx and pptx
//! - an [`OcrEngine`] (Tesseract by default) for images
//!
//! Each format is a [`FormatExtractor`] registered with the
//! [`ExtractionEngine`] under its [`DocumentKind`]; supporting a new format
//! means registering one more extractor.

mod ooxml;
mod pdf;
mod presentation;
mod raster;
mod spreadsheet;
mod word;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ExtractionConfig;
use crate::models::{DocumentKind, ExtractedDocument, ExtractionDetail};
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::utils::check_binary;

pub use pdf::{count_form_feed_pages, PdfExtractor};
pub use presentation::PresentationExtractor;
pub use raster::ImageExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use word::WordExtractor;

#[cfg(test)]
pub(crate) use ooxml::write_package;

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt {kind} document: {reason}")]
    CorruptDocument { kind: DocumentKind, reason: String },

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub(crate) fn corrupt(kind: DocumentKind, reason: impl std::fmt::Display) -> Self {
        ExtractionError::CorruptDocument {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// Extraction strategy for one document kind.
pub trait FormatExtractor: Send + Sync {
    /// The kind this extractor handles.
    fn kind(&self) -> DocumentKind;

    /// Extract text and metadata from the file at `path`.
    fn extract(
        &self,
        path: &Path,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError>;
}

/// Dispatches extraction to the extractor registered for a document kind.
pub struct ExtractionEngine {
    extractors: HashMap<DocumentKind, Box<dyn FormatExtractor>>,
}

impl ExtractionEngine {
    /// Create an engine with no extractors registered.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create an engine with every built-in extractor, using Tesseract for OCR.
    pub fn with_defaults() -> Self {
        Self::with_ocr(Arc::new(TesseractEngine::new()))
    }

    /// Create an engine with every built-in extractor and the given OCR engine.
    pub fn with_ocr(ocr: Arc<dyn OcrEngine>) -> Self {
        Self::with_image_extractor(ImageExtractor::new(ocr))
    }

    /// Create an engine with every built-in extractor, configured Tesseract
    /// language and script detection.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let ocr = TesseractEngine::new().with_language(&config.ocr_language);
        Self::with_image_extractor(
            ImageExtractor::new(Arc::new(ocr)).with_script_detection(config.detect_script),
        )
    }

    fn with_image_extractor(image: ImageExtractor) -> Self {
        let mut engine = Self::new();
        engine.register(Box::new(PdfExtractor::new()));
        engine.register(Box::new(WordExtractor));
        engine.register(Box::new(SpreadsheetExtractor));
        engine.register(Box::new(PresentationExtractor));
        engine.register(Box::new(image));
        engine
    }

    /// Register an extractor, replacing any existing one for its kind.
    pub fn register(&mut self, extractor: Box<dyn FormatExtractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    pub fn supports(&self, kind: DocumentKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Resolve the kind of a file.
    ///
    /// A known extension wins. An unknown extension is rejected. Files with
    /// no extension are sniffed by content.
    pub fn resolve_kind(path: &Path) -> Result<DocumentKind, ExtractionError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => DocumentKind::from_extension(ext)
                .ok_or_else(|| ExtractionError::UnsupportedFormat(format!(".{}", ext))),
            None => {
                let sniffed = infer::get_from_path(path)?;
                sniffed
                    .and_then(|t| DocumentKind::from_mime(t.mime_type()))
                    .ok_or_else(|| {
                        ExtractionError::UnsupportedFormat(format!(
                            "unrecognized content in {}",
                            path.display()
                        ))
                    })
            }
        }
    }

    /// Extract a file whose kind was declared by the caller.
    pub fn extract(
        &self,
        path: &Path,
        kind: DocumentKind,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let extractor = self
            .extractors
            .get(&kind)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(kind.to_string()))?;

        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(ExtractionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }

        tracing::debug!(
            "Extracting {} as {} ({} bytes)",
            path.display(),
            kind,
            meta.len()
        );
        let doc = extractor.extract(path, detail)?;
        tracing::debug!("Extracted {} words from {}", doc.word_count(), path.display());
        Ok(doc)
    }

    /// Resolve the kind of a file, then extract it.
    pub fn extract_path(
        &self,
        path: &Path,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let kind = Self::resolve_kind(path)?;
        self.extract(path, kind, detail)
    }

    /// Check if required external tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["pdftotext", "tesseract"]
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_check_tools() {
        let tools = ExtractionEngine::check_tools();
        assert_eq!(tools.len(), 2);
        for (tool, available) in tools {
            println!("{}: {}", tool, if available { "found" } else { "missing" });
        }
    }

    #[test]
    fn test_defaults_register_every_kind() {
        let engine = ExtractionEngine::with_defaults();
        for kind in DocumentKind::ALL {
            assert!(engine.supports(kind), "missing extractor for {}", kind);
        }
        assert!(!ExtractionEngine::new().supports(DocumentKind::Pdf));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        for name in ["notes.txt", "legacy.doc", "archive.zip", "data.csv"] {
            let err = ExtractionEngine::resolve_kind(Path::new(name)).unwrap_err();
            assert!(
                matches!(err, ExtractionError::UnsupportedFormat(_)),
                "{} gave {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_extension_less_file_is_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4\n%junk\n").unwrap();
        assert_eq!(
            ExtractionEngine::resolve_kind(&path).unwrap(),
            DocumentKind::Pdf
        );

        let text_path = dir.path().join("plain");
        std::fs::write(&text_path, "just some words").unwrap();
        assert!(matches!(
            ExtractionEngine::resolve_kind(&text_path),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_unregistered_kind_is_unsupported() {
        let engine = ExtractionEngine::new();
        let err = engine
            .extract(
                Path::new("whatever.pdf"),
                DocumentKind::Pdf,
                ExtractionDetail::Summary,
            )
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let engine = ExtractionEngine::with_defaults();
        let err = engine
            .extract(
                Path::new("/nonexistent/doclens/report.docx"),
                DocumentKind::Word,
                ExtractionDetail::Summary,
            )
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
