//! Data models for extraction and analysis.

mod analysis;
mod document;

pub use analysis::{
    word_count, AnalysisParams, AnalysisRequest, AnalysisResult, KeywordEntry, Operation,
    DEFAULT_SUMMARY_MAX_LENGTH, DEFAULT_SUMMARY_MIN_LENGTH, DEFAULT_TOP_N, UNKNOWN_SENTIMENT,
};
pub use document::{
    DocumentKind, DocumentMetadata, ExtractedDocument, ExtractionDetail, ScriptDetection, SheetInfo,
};
