//! Image extraction: header metadata, OCR text and detected script.

use std::path::Path;
use std::sync::Arc;

use image::ColorType;

use super::{ExtractionError, FormatExtractor};
use crate::models::{
    DocumentKind, DocumentMetadata, ExtractedDocument, ExtractionDetail, ScriptDetection,
};
use crate::ocr::{OcrEngine, OcrError};

/// Reads image properties with the `image` crate and text with an OCR engine.
pub struct ImageExtractor {
    ocr: Arc<dyn OcrEngine>,
    detect_script: bool,
}

impl ImageExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            detect_script: true,
        }
    }

    /// Enable or disable orientation and script detection.
    pub fn with_script_detection(mut self, enabled: bool) -> Self {
        self.detect_script = enabled;
        self
    }

    fn script(&self, path: &Path) -> Option<ScriptDetection> {
        if !self.detect_script {
            return None;
        }
        match self.ocr.detect_script(path) {
            Ok(detection) => detection,
            Err(e) => {
                tracing::debug!("No script detected for {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl FormatExtractor for ImageExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Image
    }

    fn extract(
        &self,
        path: &Path,
        _detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let kind = DocumentKind::Image;
        let bytes = std::fs::read(path)?;

        let format = image::guess_format(&bytes)
            .map_err(|e| ExtractionError::corrupt(kind, format!("unrecognized image: {}", e)))?;
        let img = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| ExtractionError::corrupt(kind, e))?;

        let format = format!("{:?}", format).to_uppercase();
        let color_mode = color_mode(img.color()).to_string();
        let (width, height) = (img.width(), img.height());
        drop(img);

        tracing::debug!("Running {} OCR on {}", self.ocr.engine_id(), path.display());
        let text = self.ocr.ocr_image(path).map_err(|e| match e {
            OcrError::EngineNotAvailable(msg) => ExtractionError::ToolNotFound(msg),
            OcrError::OcrFailed(msg) => ExtractionError::corrupt(kind, msg),
            OcrError::Io(e) => ExtractionError::Io(e),
        })?;

        let metadata = DocumentMetadata::Image {
            format,
            color_mode,
            width,
            height,
            script: self.script(path),
        };
        Ok(ExtractedDocument::new(text, metadata))
    }
}

/// PIL-style mode name for a decoded color type.
fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedOcr {
        result: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl FixedOcr {
        fn ok(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text),
                calls: AtomicUsize::new(0),
            })
        }

        fn missing() -> Arc<Self> {
            Arc::new(Self {
                result: Err("fake-ocr not installed"),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl OcrEngine for FixedOcr {
        fn engine_id(&self) -> &str {
            "fixed"
        }

        fn is_available(&self) -> bool {
            self.result.is_ok()
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn ocr_image(&self, _image_path: &Path) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .map(str::to_string)
                .map_err(|msg| OcrError::EngineNotAvailable(msg.to_string()))
        }
    }

    #[test]
    fn test_color_modes() {
        assert_eq!(color_mode(ColorType::L8), "L");
        assert_eq!(color_mode(ColorType::Rgba8), "RGBA");
        assert_eq!(color_mode(ColorType::L16), "I;16");
    }

    #[test]
    fn test_extract_png_metadata_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::RgbImage::new(40, 20).save(&path).unwrap();

        let ocr = FixedOcr::ok("INVOICE 42\n");
        let doc = ImageExtractor::new(ocr.clone())
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();

        assert_eq!(doc.kind, DocumentKind::Image);
        assert_eq!(doc.text, "INVOICE 42\n");
        assert_eq!(doc.word_count(), 2);
        assert_eq!(
            doc.metadata,
            DocumentMetadata::Image {
                format: "PNG".to_string(),
                color_mode: "RGB".to_string(),
                width: 40,
                height: 20,
                script: None,
            }
        );
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_grayscale_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        image::GrayImage::new(8, 8).save(&path).unwrap();

        let doc = ImageExtractor::new(FixedOcr::ok(""))
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();
        assert!(!doc.has_text());
        match doc.metadata {
            DocumentMetadata::Image {
                format, color_mode, ..
            } => {
                assert_eq!(format, "JPEG");
                assert_eq!(color_mode, "L");
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_corrupt_and_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"definitely not pixels").unwrap();

        let ocr = FixedOcr::ok("never");
        let err = ImageExtractor::new(ocr.clone())
            .extract(&path, ExtractionDetail::Summary)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::CorruptDocument {
                kind: DocumentKind::Image,
                ..
            }
        ));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_ocr_engine_is_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        image::GrayImage::new(4, 4).save(&path).unwrap();

        let err = ImageExtractor::new(FixedOcr::missing())
            .extract(&path, ExtractionDetail::Summary)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound(_)));
    }

    /// Reports a fixed script, or fails detection when `script` is `None`.
    struct ScriptOcr {
        script: Option<&'static str>,
    }

    impl OcrEngine for ScriptOcr {
        fn engine_id(&self) -> &str {
            "script"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn ocr_image(&self, _image_path: &Path) -> Result<String, OcrError> {
            Ok("PRIVET".to_string())
        }

        fn detect_script(&self, _image_path: &Path) -> Result<Option<ScriptDetection>, OcrError> {
            match self.script {
                Some(script) => Ok(Some(ScriptDetection {
                    script: script.to_string(),
                    script_confidence: 3.5,
                    orientation_degrees: 0,
                    rotate: 0,
                    orientation_confidence: 9.1,
                })),
                None => Err(OcrError::OcrFailed("Too few characters".to_string())),
            }
        }
    }

    fn script_of(doc: &ExtractedDocument) -> Option<&str> {
        match &doc.metadata {
            DocumentMetadata::Image { script, .. } => script.as_ref().map(|s| s.script.as_str()),
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[test]
    fn test_script_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sign.png");
        image::RgbImage::new(16, 16).save(&path).unwrap();

        let ocr = Arc::new(ScriptOcr {
            script: Some("Cyrillic"),
        });
        let doc = ImageExtractor::new(ocr.clone())
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();
        assert_eq!(doc.text, "PRIVET");
        assert_eq!(script_of(&doc), Some("Cyrillic"));

        let doc = ImageExtractor::new(ocr)
            .with_script_detection(false)
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();
        assert_eq!(script_of(&doc), None);
    }

    #[test]
    fn test_failed_script_detection_keeps_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        image::RgbImage::new(16, 16).save(&path).unwrap();

        let doc = ImageExtractor::new(Arc::new(ScriptOcr { script: None }))
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();
        assert_eq!(doc.text, "PRIVET");
        assert_eq!(script_of(&doc), None);
    }
}
