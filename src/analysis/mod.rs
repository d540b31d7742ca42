//! Text analysis: sentiment, summarization and keyword extraction.

mod chunk;
mod keywords;
mod pipeline;
pub mod stopwords;

pub use chunk::{chunk_chars, truncate_chars};
pub use keywords::{content_words, tokenize, top_keywords};
pub use pipeline::AnalysisPipeline;
