//! Sentiment and summarization backends.
//!
//! Backends are expensive to build (lexicon loading, model wrappers), so the
//! [`BackendManager`] constructs each kind at most once and hands out shared
//! [`BackendHandle`]s. What gets built is decided by a [`BackendFactory`].

mod command;
mod extractive;
mod factory;
mod lexicon;
mod manager;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::CommandBackend;
pub use extractive::{FrequencySummarizer, DEFAULT_SUMMARY_MAX_INPUT};
pub use factory::{BackendConfig, BackendEngine, BackendFactory, ConfiguredFactory};
pub use lexicon::{LexiconSentiment, DEFAULT_SENTIMENT_MAX_INPUT, NEGATIVE, POSITIVE};
pub use manager::{BackendManager, BackendStatus};

/// The two lazily-constructed backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sentiment,
    Summary,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Sentiment, BackendKind::Summary];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sentiment => "sentiment",
            BackendKind::Summary => "summary",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from backend construction and inference.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to construct {kind} backend: {reason}")]
    ConstructionFailed { kind: BackendKind, reason: String },

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid backend output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A classification with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: String,
    pub score: f64,
}

/// Text classifier producing a top label.
pub trait SentimentBackend: Send + Sync {
    fn backend_id(&self) -> &str;

    /// Longest input, in characters, the backend accepts.
    fn max_input_chars(&self) -> usize;

    fn classify(&self, text: &str) -> Result<SentimentScore, BackendError>;
}

/// Summarizer over bounded input.
pub trait SummaryBackend: Send + Sync {
    fn backend_id(&self) -> &str;

    /// Longest input, in characters, the backend accepts.
    fn max_input_chars(&self) -> usize;

    /// Summarize `text` into roughly `min_length..=max_length` words.
    fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, BackendError>;
}

/// A constructed backend, shared across threads until shutdown.
#[derive(Clone)]
pub enum BackendHandle {
    Sentiment(Arc<dyn SentimentBackend>),
    Summary(Arc<dyn SummaryBackend>),
}

impl BackendHandle {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendHandle::Sentiment(_) => BackendKind::Sentiment,
            BackendHandle::Summary(_) => BackendKind::Summary,
        }
    }

    pub fn backend_id(&self) -> &str {
        match self {
            BackendHandle::Sentiment(b) => b.backend_id(),
            BackendHandle::Summary(b) => b.backend_id(),
        }
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendHandle({}: {})", self.kind(), self.backend_id())
    }
}
