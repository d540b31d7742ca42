//! Extractive summarizer based on content-word frequency.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::{BackendError, SummaryBackend};
use crate::analysis::content_words;
use crate::models::word_count;

/// Default input limit, in characters.
pub const DEFAULT_SUMMARY_MAX_INPUT: usize = 1024;

fn sentence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]*").expect("valid sentence regex"))
}

/// Picks the highest-scoring sentences, keeping their original order.
///
/// A sentence scores the sum of its content words' frequencies, normalized
/// by the most frequent word. Output never exceeds `max_length` words;
/// lower-scoring sentences are added while they fit, which usually reaches
/// `min_length` when the input is long enough.
pub struct FrequencySummarizer {
    max_input_chars: usize,
}

impl FrequencySummarizer {
    pub fn new() -> Self {
        Self {
            max_input_chars: DEFAULT_SUMMARY_MAX_INPUT,
        }
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryBackend for FrequencySummarizer {
    fn backend_id(&self) -> &str {
        "frequency"
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, BackendError> {
        if max_length == 0 {
            return Ok(String::new());
        }
        if min_length > max_length {
            return Err(BackendError::InferenceFailed(format!(
                "min_length {} exceeds max_length {}",
                min_length, max_length
            )));
        }

        let sentences: Vec<&str> = sentence_regex()
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();
        if sentences.is_empty() {
            return Ok(first_words(text, max_length));
        }

        let mut freq: HashMap<String, f64> = HashMap::new();
        for word in content_words(text) {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }
        let top = freq.values().copied().fold(0.0, f64::max);

        let mut ranked: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                let score = if top > 0.0 {
                    content_words(sentence)
                        .iter()
                        .map(|w| freq.get(w).copied().unwrap_or(0.0) / top)
                        .sum()
                } else {
                    0.0
                };
                (idx, score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut chosen = Vec::new();
        let mut words = 0;
        for (idx, _) in &ranked {
            let len = word_count(sentences[*idx]);
            if words + len <= max_length {
                chosen.push(*idx);
                words += len;
            }
            if words >= max_length {
                break;
            }
        }

        if chosen.is_empty() {
            // Every sentence is longer than the budget: cut the best one.
            return Ok(first_words(sentences[ranked[0].0], max_length));
        }

        chosen.sort_unstable();
        Ok(chosen
            .into_iter()
            .map(|idx| sentences[idx])
            .collect::<Vec<_>>()
            .join(" "))
    }
}

fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}
