//! OCR engines used by image extraction.
//!
//! Tesseract (via its command-line tool) is the default engine. The
//! `OcrEngine` trait keeps the image extractor independent of the engine so
//! other engines can be plugged in.

mod tesseract;

use std::path::Path;
use thiserror::Error;

use crate::models::ScriptDetection;

pub use tesseract::{TesseractEngine, DEFAULT_LANGUAGE};

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for OCR engines.
pub trait OcrEngine: Send + Sync {
    /// Engine identifier (e.g. "tesseract").
    fn engine_id(&self) -> &str;

    /// Check if this engine can run (binaries installed, models present).
    fn is_available(&self) -> bool;

    /// Describe what's needed to make this engine available.
    fn availability_hint(&self) -> String;

    /// Recognize text in an image file.
    fn ocr_image(&self, image_path: &Path) -> Result<String, OcrError>;

    /// Detect text orientation and script. Engines without detection
    /// return `Ok(None)`.
    fn detect_script(&self, _image_path: &Path) -> Result<Option<ScriptDetection>, OcrError> {
        Ok(None)
    }
}
