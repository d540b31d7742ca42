//! Tesseract OCR engine.
//!
//! Runs the `tesseract` command-line tool and reads recognized text from
//! stdout. Orientation and script detection uses page segmentation mode 0,
//! which needs the `osd` traineddata.

use std::path::Path;
use std::process::Command;

use super::{OcrEngine, OcrError};
use crate::models::ScriptDetection;
use crate::utils::{check_binary, command_stdout, ToolFailure};

/// Default Tesseract language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Tesseract OCR engine.
pub struct TesseractEngine {
    language: String,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Set the Tesseract language (e.g. "eng", "deu+eng").
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn run(&self, command: &mut Command) -> Result<String, OcrError> {
        command_stdout(command.output()).map_err(|failure| match failure {
            ToolFailure::NotFound => OcrError::EngineNotAvailable(
                "tesseract not found (install tesseract-ocr)".to_string(),
            ),
            ToolFailure::Failed(msg) => OcrError::OcrFailed(format!("tesseract failed: {}", msg)),
            ToolFailure::Io(e) => OcrError::Io(e),
        })
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn engine_id(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            format!("Tesseract is available (language: {})", self.language)
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }

    fn ocr_image(&self, image_path: &Path) -> Result<String, OcrError> {
        tracing::debug!("Running tesseract on {}", image_path.display());
        self.run(
            Command::new("tesseract")
                .arg(image_path)
                .arg("stdout")
                .args(["-l", &self.language]),
        )
    }

    fn detect_script(&self, image_path: &Path) -> Result<Option<ScriptDetection>, OcrError> {
        tracing::debug!("Running tesseract OSD on {}", image_path.display());
        let stdout = self.run(
            Command::new("tesseract")
                .arg(image_path)
                .arg("stdout")
                .args(["--psm", "0"]),
        )?;
        Ok(parse_osd(&stdout))
    }
}

/// Parse the `key: value` report printed by `tesseract --psm 0`.
///
/// Returns `None` when the report names no script.
pub fn parse_osd(report: &str) -> Option<ScriptDetection> {
    let mut detection = ScriptDetection {
        script: String::new(),
        script_confidence: 0.0,
        orientation_degrees: 0,
        rotate: 0,
        orientation_confidence: 0.0,
    };
    for line in report.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Script" => detection.script = value.to_string(),
            "Script confidence" => detection.script_confidence = value.parse().unwrap_or(0.0),
            "Orientation in degrees" => detection.orientation_degrees = value.parse().unwrap_or(0),
            "Rotate" => detection.rotate = value.parse().unwrap_or(0),
            "Orientation confidence" => {
                detection.orientation_confidence = value.parse().unwrap_or(0.0)
            }
            _ => {}
        }
    }
    if detection.script.is_empty() {
        None
    } else {
        Some(detection)
    }
}
