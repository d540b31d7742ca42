//! doclens - document extraction and text analysis.
//!
//! Turns PDF, Word, spreadsheet, presentation and image files into plain
//! text and runs sentiment, summary and keyword analyses over text, with
//! lazily constructed backends and a bounded result cache.

pub mod analysis;
pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::{AnalyzerError, DocumentAnalyzer};
