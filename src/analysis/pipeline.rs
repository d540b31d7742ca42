//! Sentiment, summary and keyword analysis over managed backends.

use std::sync::Arc;

use super::chunk::{chunk_chars, truncate_chars};
use super::keywords::top_keywords;
use crate::backend::{BackendError, BackendManager};
use crate::models::{word_count, AnalysisParams, AnalysisRequest, AnalysisResult, Operation};

/// Runs analysis requests, pulling backends from a [`BackendManager`].
pub struct AnalysisPipeline {
    backends: Arc<BackendManager>,
}

impl AnalysisPipeline {
    pub fn new(backends: Arc<BackendManager>) -> Self {
        Self { backends }
    }

    pub fn backends(&self) -> &Arc<BackendManager> {
        &self.backends
    }

    /// Run one analysis.
    ///
    /// Inference problems come back as [`AnalysisResult::Failure`]; only a
    /// backend that cannot be constructed is an `Err`.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let operation = request.operation();
        if request.text.trim().is_empty() {
            return Ok(AnalysisResult::failure(
                operation,
                "input text is empty",
                &request.text,
            ));
        }

        match request.params {
            AnalysisParams::Sentiment => self.sentiment(&request.text),
            AnalysisParams::Summary {
                max_length,
                min_length,
            } => self.summary(&request.text, max_length, min_length),
            AnalysisParams::Keywords { top_n } => Ok(AnalysisResult::Keywords {
                entries: top_keywords(&request.text, top_n),
            }),
        }
    }

    fn sentiment(&self, text: &str) -> Result<AnalysisResult, BackendError> {
        let backend = self.backends.sentiment()?;
        let input = truncate_chars(text, backend.max_input_chars());

        match backend.classify(input) {
            Ok(score) => Ok(AnalysisResult::Sentiment {
                label: score.label,
                confidence: round4(score.score.clamp(0.0, 1.0)),
            }),
            Err(e) => Ok(contained(Operation::Sentiment, e, text)),
        }
    }

    fn summary(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<AnalysisResult, BackendError> {
        let original_word_count = word_count(text);
        if original_word_count < min_length {
            tracing::debug!(
                "Summary passthrough: {} words < min_length {}",
                original_word_count,
                min_length
            );
            return Ok(AnalysisResult::passthrough_summary(text));
        }

        let backend = self.backends.summarizer()?;
        let chunks = chunk_chars(text, backend.max_input_chars());
        tracing::debug!(
            "Summarizing {} words in {} chunk(s) with '{}'",
            original_word_count,
            chunks.len(),
            backend.backend_id()
        );

        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match backend.summarize(chunk, max_length, min_length) {
                Ok(part) => parts.push(part),
                Err(e) => return Ok(contained(Operation::Summary, e, text)),
            }
        }

        let mut summary = parts.join(" ");
        // Chunk boundaries can split words; never report more words than the input.
        if word_count(&summary) > original_word_count {
            summary = summary
                .split_whitespace()
                .take(original_word_count)
                .collect::<Vec<_>>()
                .join(" ");
        }

        Ok(AnalysisResult::Summary {
            summary_word_count: word_count(&summary),
            text: summary,
            original_word_count,
        })
    }
}

fn contained(operation: Operation, err: BackendError, input: &str) -> AnalysisResult {
    tracing::warn!("{} analysis failed: {}", operation, err);
    AnalysisResult::failure(operation, err.to_string(), input)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
