//! End-to-end extraction of generated documents.

mod common;

use std::path::Path;
use std::sync::Arc;

use doclens::extract::{ExtractionEngine, ExtractionError};
use doclens::models::{DocumentKind, DocumentMetadata, ExtractionDetail};
use doclens::ocr::{OcrEngine, OcrError};

/// OCR engine that returns fixed text without running anything.
struct StubOcr;

impl OcrEngine for StubOcr {
    fn engine_id(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "always available".to_string()
    }

    fn ocr_image(&self, _image_path: &Path) -> Result<String, OcrError> {
        Ok("INVOICE 42".to_string())
    }
}

fn engine() -> ExtractionEngine {
    ExtractionEngine::with_ocr(Arc::new(StubOcr))
}

#[test]
fn test_docx_paragraphs() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::docx(
        dir.path(),
        "letter.docx",
        &["Dear committee,", "", "Profits & losses are attached."],
    );

    let doc = engine()
        .extract_path(&path, ExtractionDetail::Summary)
        .unwrap();
    assert_eq!(doc.kind, DocumentKind::Word);
    assert_eq!(doc.text, "Dear committee,\n\nProfits & losses are attached.");
    assert_eq!(doc.metadata, DocumentMetadata::Word { paragraph_count: 3 });
    assert_eq!(doc.word_count(), 7);
}

#[test]
fn test_xlsx_sheets_and_detail() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::xlsx(
        dir.path(),
        "budget.xlsx",
        &[
            ("Q1", vec![vec!["Item", "Cost"], vec!["Rent", "1200"]]),
            ("Notes", vec![vec!["Reviewed"]]),
        ],
    );

    let engine = engine();
    let doc = engine
        .extract(&path, DocumentKind::Spreadsheet, ExtractionDetail::Summary)
        .unwrap();
    assert_eq!(doc.text, "Item\tCost\nRent\t1200\n\nReviewed");
    let DocumentMetadata::Spreadsheet { sheets } = &doc.metadata else {
        panic!("expected spreadsheet metadata");
    };
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].name, "Q1");
    assert_eq!((sheets[0].rows, sheets[0].columns), (2, 2));
    assert_eq!((sheets[1].rows, sheets[1].columns), (1, 1));
    assert!(sheets.iter().all(|s| s.cells.is_none()));

    let full = engine
        .extract(&path, DocumentKind::Spreadsheet, ExtractionDetail::Full)
        .unwrap();
    assert_eq!(full.text, doc.text);
    let DocumentMetadata::Spreadsheet { sheets } = full.metadata else {
        panic!("expected spreadsheet metadata");
    };
    assert_eq!(
        sheets[0].cells,
        Some(vec![
            vec!["Item".to_string(), "Cost".to_string()],
            vec!["Rent".to_string(), "1200".to_string()],
        ])
    );
}

#[test]
fn test_pptx_slides() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::pptx(
        dir.path(),
        "deck.pptx",
        &[vec!["Quarterly review"], vec!["Revenue", "Costs"], vec![]],
    );

    let doc = engine()
        .extract_path(&path, ExtractionDetail::Summary)
        .unwrap();
    assert_eq!(doc.kind, DocumentKind::Presentation);
    assert_eq!(doc.text, "Quarterly review\nRevenue\nCosts\n");
    assert_eq!(
        doc.metadata,
        DocumentMetadata::Presentation {
            slide_count: 3,
            slides: vec![
                "Quarterly review".to_string(),
                "Revenue\nCosts".to_string(),
                String::new(),
            ],
        }
    );
}

#[test]
fn test_png_metadata_and_ocr() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::png(dir.path(), "scan.png", 32, 16);

    let doc = engine()
        .extract_path(&path, ExtractionDetail::Summary)
        .unwrap();
    assert_eq!(doc.text, "INVOICE 42");
    assert_eq!(
        doc.metadata,
        DocumentMetadata::Image {
            format: "PNG".to_string(),
            color_mode: "RGB".to_string(),
            width: 32,
            height: 16,
            script: None,
        }
    );
}

#[test]
fn test_kind_sniffed_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let png = common::png(dir.path(), "scan.png", 4, 4);
    let bare = dir.path().join("upload");
    std::fs::copy(&png, &bare).unwrap();

    assert_eq!(
        ExtractionEngine::resolve_kind(&bare).unwrap(),
        DocumentKind::Image
    );
}

#[test]
fn test_unsupported_and_corrupt_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine();

    let legacy = dir.path().join("old.doc");
    std::fs::write(&legacy, b"\xd0\xcf\x11\xe0 legacy").unwrap();
    assert!(matches!(
        engine.extract_path(&legacy, ExtractionDetail::Summary),
        Err(ExtractionError::UnsupportedFormat(_))
    ));

    let fake = dir.path().join("fake.docx");
    std::fs::write(&fake, b"this is not a zip archive").unwrap();
    assert!(matches!(
        engine.extract_path(&fake, ExtractionDetail::Summary),
        Err(ExtractionError::CorruptDocument {
            kind: DocumentKind::Word,
            ..
        })
    ));

    let missing = dir.path().join("missing.pptx");
    assert!(matches!(
        engine.extract_path(&missing, ExtractionDetail::Summary),
        Err(ExtractionError::Io(_))
    ));
}

#[test]
fn test_declared_kind_wins_over_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::docx(dir.path(), "upload.bin", &["Declared"]);

    let doc = engine()
        .extract(&path, DocumentKind::Word, ExtractionDetail::Summary)
        .unwrap();
    assert_eq!(doc.text, "Declared");
}
