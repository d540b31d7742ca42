//! Service layer for doclens.
//!
//! Combines extraction, analysis and caching for use by the CLI or any
//! other front end.

pub mod analyzer;

pub use analyzer::{AnalyzerError, CachedValue, DocumentAnalyzer};
