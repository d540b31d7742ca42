//! Analysis request and result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default upper bound on summary length, in words.
pub const DEFAULT_SUMMARY_MAX_LENGTH: usize = 130;
/// Default lower bound on summary length, in words. Inputs with fewer
/// words are passed through unsummarized.
pub const DEFAULT_SUMMARY_MIN_LENGTH: usize = 30;
/// Default number of keywords returned.
pub const DEFAULT_TOP_N: usize = 10;

/// Label reported when sentiment could not be determined.
pub const UNKNOWN_SENTIMENT: &str = "UNKNOWN";

/// Analysis operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Sentiment,
    Summary,
    Keywords,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Sentiment => "sentiment",
            Operation::Summary => "summary",
            Operation::Keywords => "keywords",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sentiment" => Some(Operation::Sentiment),
            "summary" | "summarize" => Some(Operation::Summary),
            "keywords" => Some(Operation::Keywords),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operation-specific tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum AnalysisParams {
    Sentiment,
    Summary { max_length: usize, min_length: usize },
    Keywords { top_n: usize },
}

impl AnalysisParams {
    pub fn operation(&self) -> Operation {
        match self {
            AnalysisParams::Sentiment => Operation::Sentiment,
            AnalysisParams::Summary { .. } => Operation::Summary,
            AnalysisParams::Keywords { .. } => Operation::Keywords,
        }
    }

    /// Default parameters for an operation.
    pub fn defaults_for(operation: Operation) -> Self {
        match operation {
            Operation::Sentiment => AnalysisParams::Sentiment,
            Operation::Summary => AnalysisParams::Summary {
                max_length: DEFAULT_SUMMARY_MAX_LENGTH,
                min_length: DEFAULT_SUMMARY_MIN_LENGTH,
            },
            Operation::Keywords => AnalysisParams::Keywords {
                top_n: DEFAULT_TOP_N,
            },
        }
    }

    /// Parameters as a sorted name/value map, used for cache key derivation.
    pub fn to_sorted_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        match self {
            AnalysisParams::Sentiment => {}
            AnalysisParams::Summary {
                max_length,
                min_length,
            } => {
                map.insert("max_length".to_string(), max_length.to_string());
                map.insert("min_length".to_string(), min_length.to_string());
            }
            AnalysisParams::Keywords { top_n } => {
                map.insert("top_n".to_string(), top_n.to_string());
            }
        }
        map
    }
}

/// One unit of analysis work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    pub params: AnalysisParams,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>, params: AnalysisParams) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }

    pub fn sentiment(text: impl Into<String>) -> Self {
        Self::new(text, AnalysisParams::Sentiment)
    }

    pub fn summary(text: impl Into<String>, max_length: usize, min_length: usize) -> Self {
        Self::new(
            text,
            AnalysisParams::Summary {
                max_length,
                min_length,
            },
        )
    }

    pub fn keywords(text: impl Into<String>, top_n: usize) -> Self {
        Self::new(text, AnalysisParams::Keywords { top_n })
    }

    pub fn operation(&self) -> Operation {
        self.params.operation()
    }
}

/// A keyword and its frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub word: String,
    pub count: usize,
}

impl KeywordEntry {
    pub fn new(word: impl Into<String>, count: usize) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

/// Result of an analysis call.
///
/// `Failure` is a value: callers must check the variant instead of assuming
/// success. Its `fallback` keeps the response shape of the operation stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum AnalysisResult {
    Sentiment {
        label: String,
        confidence: f64,
    },
    Summary {
        text: String,
        original_word_count: usize,
        summary_word_count: usize,
    },
    Keywords {
        entries: Vec<KeywordEntry>,
    },
    Failure {
        operation: Operation,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Box<AnalysisResult>>,
    },
}

impl AnalysisResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisResult::Failure { .. })
    }

    /// Summary passthrough: the input echoed with equal word counts.
    pub fn passthrough_summary(text: &str) -> Self {
        let words = word_count(text);
        AnalysisResult::Summary {
            text: text.to_string(),
            original_word_count: words,
            summary_word_count: words,
        }
    }

    /// Build a failure for `operation` with the operation's stable fallback.
    pub fn failure(operation: Operation, reason: impl Into<String>, input: &str) -> Self {
        let fallback = match operation {
            Operation::Sentiment => AnalysisResult::Sentiment {
                label: UNKNOWN_SENTIMENT.to_string(),
                confidence: 0.0,
            },
            Operation::Summary => Self::passthrough_summary(input),
            Operation::Keywords => AnalysisResult::Keywords {
                entries: Vec::new(),
            },
        };
        AnalysisResult::Failure {
            operation,
            reason: reason.into(),
            fallback: Some(Box::new(fallback)),
        }
    }
}

/// Whitespace-split word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
