//! Extracted document model.
//!
//! An `ExtractedDocument` is the canonical text+metadata form every
//! supported file format is normalized into.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
    Image,
}

impl DocumentKind {
    /// All kinds, in registration order.
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Pdf,
        DocumentKind::Word,
        DocumentKind::Spreadsheet,
        DocumentKind::Presentation,
        DocumentKind::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Word => "word",
            DocumentKind::Spreadsheet => "spreadsheet",
            DocumentKind::Presentation => "presentation",
            DocumentKind::Image => "image",
        }
    }

    /// Parse a kind from its name or from a file extension.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "word" | "docx" => Some(DocumentKind::Word),
            "spreadsheet" | "xlsx" => Some(DocumentKind::Spreadsheet),
            "presentation" | "pptx" => Some(DocumentKind::Presentation),
            "image" => Some(DocumentKind::Image),
            other => Self::from_extension(other),
        }
    }

    /// Map a file extension (without the dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Word),
            "xlsx" => Some(DocumentKind::Spreadsheet),
            "pptx" => Some(DocumentKind::Presentation),
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" => Some(DocumentKind::Image),
            _ => None,
        }
    }

    /// Map a MIME type (as reported by content sniffing) to a kind.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(DocumentKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentKind::Word)
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(DocumentKind::Spreadsheet)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(DocumentKind::Presentation)
            }
            "image/png" | "image/jpeg" | "image/gif" | "image/bmp" | "image/tiff" => {
                Some(DocumentKind::Image)
            }
            _ => None,
        }
    }

    /// Kind declared by a path's extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much structure to materialize during extraction.
///
/// Only spreadsheets care: analysis needs sheet extents, text extraction
/// wants the full cell grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionDetail {
    #[default]
    Summary,
    Full,
}

/// A single worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    /// Stringified cell grid (present with `ExtractionDetail::Full`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<Vec<String>>>,
}

/// Orientation and script detected by the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDetection {
    /// Script name, e.g. "Latin" or "Cyrillic".
    pub script: String,
    pub script_confidence: f64,
    /// Orientation of the page text, in degrees.
    pub orientation_degrees: u32,
    /// Clockwise rotation that would make the text upright.
    pub rotate: u32,
    pub orientation_confidence: f64,
}

/// Kind-specific metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentMetadata {
    Pdf {
        /// Form-feed segment count. Approximate: a trailing form feed
        /// counts as an extra page.
        page_count: usize,
    },
    Word {
        paragraph_count: usize,
    },
    Spreadsheet {
        sheets: Vec<SheetInfo>,
    },
    Presentation {
        slide_count: usize,
        slides: Vec<String>,
    },
    Image {
        format: String,
        color_mode: String,
        width: u32,
        height: u32,
        /// Absent when detection is disabled or the engine found too little text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        script: Option<ScriptDetection>,
    },
}

impl DocumentMetadata {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentMetadata::Pdf { .. } => DocumentKind::Pdf,
            DocumentMetadata::Word { .. } => DocumentKind::Word,
            DocumentMetadata::Spreadsheet { .. } => DocumentKind::Spreadsheet,
            DocumentMetadata::Presentation { .. } => DocumentKind::Presentation,
            DocumentMetadata::Image { .. } => DocumentKind::Image,
        }
    }
}

/// Result of extracting a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub kind: DocumentKind,
    /// Concatenated text. Empty is valid for documents without text.
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    pub fn new(text: String, metadata: DocumentMetadata) -> Self {
        Self {
            kind: metadata.kind(),
            text,
            metadata,
        }
    }

    /// Whitespace-delimited word count of the extracted text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
