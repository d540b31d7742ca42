//! Configuration-driven backend construction.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    BackendError, BackendHandle, BackendKind, CommandBackend, FrequencySummarizer,
    LexiconSentiment, DEFAULT_SENTIMENT_MAX_INPUT, DEFAULT_SUMMARY_MAX_INPUT,
};

/// Builds a backend of the requested kind. Called by the manager at most
/// once per initialization.
pub trait BackendFactory: Send + Sync {
    fn build(&self, kind: BackendKind) -> Result<BackendHandle, BackendError>;
}

/// Available backend engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendEngine {
    /// Built-in polarity lexicon (sentiment only).
    Lexicon,
    /// Built-in extractive summarizer (summary only).
    Frequency,
    /// External program speaking JSON on stdout.
    Command,
}

impl BackendEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendEngine::Lexicon => "lexicon",
            BackendEngine::Frequency => "frequency",
            BackendEngine::Command => "command",
        }
    }

    /// Built-in engine for a backend kind.
    pub fn default_for(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Sentiment => BackendEngine::Lexicon,
            BackendKind::Summary => BackendEngine::Frequency,
        }
    }
}

/// Settings for one backend kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Engine to use (default: lexicon for sentiment, frequency for summary).
    #[serde(default)]
    pub engine: Option<BackendEngine>,
    /// Program to run for the `command` engine.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments for the `command` engine.
    #[serde(default)]
    pub args: Vec<String>,
    /// Lexicon file (`word<TAB>weight`) for the `lexicon` engine.
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    /// Input limit in characters.
    #[serde(default)]
    pub max_input_chars: Option<usize>,
}

impl BackendConfig {
    pub fn engine_for(&self, kind: BackendKind) -> BackendEngine {
        self.engine.unwrap_or_else(|| BackendEngine::default_for(kind))
    }

    pub fn max_input_chars_for(&self, kind: BackendKind) -> usize {
        self.max_input_chars.unwrap_or(match kind {
            BackendKind::Sentiment => DEFAULT_SENTIMENT_MAX_INPUT,
            BackendKind::Summary => DEFAULT_SUMMARY_MAX_INPUT,
        })
    }
}

/// Factory that builds backends from [`BackendConfig`]s.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredFactory {
    sentiment: BackendConfig,
    summary: BackendConfig,
}

impl ConfiguredFactory {
    pub fn new(sentiment: BackendConfig, summary: BackendConfig) -> Self {
        Self { sentiment, summary }
    }

    pub fn config(&self, kind: BackendKind) -> &BackendConfig {
        match kind {
            BackendKind::Sentiment => &self.sentiment,
            BackendKind::Summary => &self.summary,
        }
    }
}

impl BackendFactory for ConfiguredFactory {
    fn build(&self, kind: BackendKind) -> Result<BackendHandle, BackendError> {
        let config = self.config(kind);
        let engine = config.engine_for(kind);
        let max_chars = config.max_input_chars_for(kind);
        if max_chars == 0 {
            return Err(BackendError::ConstructionFailed {
                kind,
                reason: "max_input_chars must be positive".to_string(),
            });
        }

        match (kind, engine) {
            (BackendKind::Sentiment, BackendEngine::Lexicon) => {
                let lexicon = match &config.lexicon_path {
                    Some(path) => LexiconSentiment::from_file(path).map_err(|e| match e {
                        BackendError::ConstructionFailed { .. } => e,
                        other => BackendError::ConstructionFailed {
                            kind,
                            reason: format!("{}: {}", path.display(), other),
                        },
                    })?,
                    None => LexiconSentiment::new(),
                };
                Ok(BackendHandle::Sentiment(Arc::new(
                    lexicon.with_max_input_chars(max_chars),
                )))
            }
            (BackendKind::Summary, BackendEngine::Frequency) => Ok(BackendHandle::Summary(
                Arc::new(FrequencySummarizer::new().with_max_input_chars(max_chars)),
            )),
            (_, BackendEngine::Command) => {
                let program = config.command.as_deref().ok_or_else(|| {
                    BackendError::ConstructionFailed {
                        kind,
                        reason: "the command engine needs a `command`".to_string(),
                    }
                })?;
                let backend = Arc::new(CommandBackend::new(
                    kind,
                    program,
                    config.args.clone(),
                    max_chars,
                )?);
                Ok(match kind {
                    BackendKind::Sentiment => BackendHandle::Sentiment(backend),
                    BackendKind::Summary => BackendHandle::Summary(backend),
                })
            }
            (kind, engine) => Err(BackendError::ConstructionFailed {
                kind,
                reason: format!("engine '{}' cannot provide {}", engine.as_str(), kind),
            }),
        }
    }
}
