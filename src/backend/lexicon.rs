//! Lexicon-based sentiment classifier.
//!
//! Scores text by summing word polarities, with simple negation and
//! intensifier handling, and maps the total through a logistic curve.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::{BackendError, BackendKind, SentimentBackend, SentimentScore};

pub const POSITIVE: &str = "POSITIVE";
pub const NEGATIVE: &str = "NEGATIVE";

/// Default input limit, in characters.
pub const DEFAULT_SENTIMENT_MAX_INPUT: usize = 512;

/// How many preceding tokens a negator reaches.
const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f64 = -0.75;

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "cannot", "without",
    "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "werent", "wont", "cant", "couldnt",
    "shouldnt", "wouldnt", "hardly",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("really", 1.3),
    ("so", 1.3),
    ("extremely", 2.0),
    ("incredibly", 1.8),
    ("absolutely", 1.8),
    ("totally", 1.5),
    ("highly", 1.5),
    ("quite", 1.2),
    ("somewhat", 0.7),
    ("slightly", 0.5),
    ("barely", 0.4),
];

const BUILTIN_LEXICON: &[(&str, f64)] = &[
    ("good", 2.0),
    ("great", 3.0),
    ("excellent", 3.0),
    ("amazing", 3.0),
    ("awesome", 3.0),
    ("fantastic", 3.0),
    ("wonderful", 3.0),
    ("outstanding", 3.0),
    ("superb", 3.0),
    ("love", 3.0),
    ("loved", 3.0),
    ("lovely", 2.5),
    ("like", 1.5),
    ("liked", 1.5),
    ("enjoy", 2.0),
    ("enjoyed", 2.0),
    ("happy", 2.5),
    ("glad", 2.0),
    ("pleased", 2.0),
    ("delighted", 3.0),
    ("nice", 2.0),
    ("best", 3.0),
    ("better", 1.5),
    ("beautiful", 2.5),
    ("brilliant", 3.0),
    ("perfect", 3.0),
    ("positive", 2.0),
    ("success", 2.0),
    ("successful", 2.0),
    ("recommend", 2.0),
    ("recommended", 2.0),
    ("helpful", 2.0),
    ("friendly", 2.0),
    ("fast", 1.0),
    ("easy", 1.5),
    ("reliable", 2.0),
    ("impressive", 2.5),
    ("satisfied", 2.0),
    ("thanks", 1.5),
    ("thank", 1.5),
    ("win", 2.0),
    ("won", 2.0),
    ("gain", 1.5),
    ("growth", 1.5),
    ("improved", 2.0),
    ("improvement", 2.0),
    ("benefit", 1.5),
    ("fine", 1.0),
    ("calm", 1.0),
    ("fun", 2.0),
    ("bad", -2.5),
    ("terrible", -3.0),
    ("awful", -3.0),
    ("horrible", -3.0),
    ("worst", -3.0),
    ("worse", -2.0),
    ("poor", -2.0),
    ("hate", -3.0),
    ("hated", -3.0),
    ("dislike", -2.0),
    ("disappointed", -2.5),
    ("disappointing", -2.5),
    ("sad", -2.0),
    ("angry", -2.5),
    ("annoying", -2.0),
    ("annoyed", -2.0),
    ("broken", -2.0),
    ("fail", -2.0),
    ("failed", -2.0),
    ("failure", -2.0),
    ("problem", -1.5),
    ("problems", -1.5),
    ("issue", -1.0),
    ("issues", -1.0),
    ("slow", -1.5),
    ("useless", -2.5),
    ("waste", -2.5),
    ("wasted", -2.5),
    ("boring", -2.0),
    ("ugly", -2.5),
    ("rude", -2.5),
    ("unhappy", -2.5),
    ("negative", -2.0),
    ("loss", -2.0),
    ("lost", -1.5),
    ("decline", -1.5),
    ("risk", -1.0),
    ("difficult", -1.5),
    ("hard", -0.5),
    ("wrong", -2.0),
    ("error", -1.5),
    ("errors", -1.5),
    ("crash", -2.5),
    ("expensive", -1.5),
    ("refund", -1.0),
    ("complaint", -2.0),
    ("mediocre", -1.5),
    ("unacceptable", -3.0),
    ("dangerous", -2.5),
    ("fraud", -3.0),
];

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w']+").expect("valid token regex"))
}

/// Polarity-lexicon sentiment classifier.
pub struct LexiconSentiment {
    weights: HashMap<String, f64>,
    max_input_chars: usize,
    source: String,
}

impl LexiconSentiment {
    /// Classifier using the built-in lexicon.
    pub fn new() -> Self {
        Self {
            weights: BUILTIN_LEXICON
                .iter()
                .map(|(word, weight)| (word.to_string(), *weight))
                .collect(),
            max_input_chars: DEFAULT_SENTIMENT_MAX_INPUT,
            source: "builtin".to_string(),
        }
    }

    /// Classifier using a `word<TAB>weight` lexicon file instead of the
    /// built-in one. Blank lines and `#` comments are ignored.
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let contents = std::fs::read_to_string(path)?;
        let weights = parse_lexicon(&contents).map_err(|reason| {
            BackendError::ConstructionFailed {
                kind: BackendKind::Sentiment,
                reason: format!("{}: {}", path.display(), reason),
            }
        })?;
        tracing::debug!("Loaded {} lexicon entries from {}", weights.len(), path.display());
        Ok(Self {
            weights,
            max_input_chars: DEFAULT_SENTIMENT_MAX_INPUT,
            source: path.display().to_string(),
        })
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// Where the lexicon came from ("builtin" or a file path).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw polarity score; positive means positive sentiment.
    pub fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens: Vec<String> = token_regex()
            .find_iter(&lowered)
            .map(|m| m.as_str().replace('\'', ""))
            .collect();

        let mut total = 0.0;
        for (idx, token) in tokens.iter().enumerate() {
            let Some(&weight) = self.weights.get(token.as_str()) else {
                continue;
            };

            let mut value = weight;
            if let Some(prev) = idx.checked_sub(1).map(|i| tokens[i].as_str()) {
                if let Some((_, factor)) = INTENSIFIERS.iter().find(|(w, _)| *w == prev) {
                    value *= factor;
                }
            }
            let window = &tokens[idx.saturating_sub(NEGATION_WINDOW)..idx];
            if window.iter().any(|t| NEGATORS.contains(&t.as_str())) {
                value *= NEGATION_FACTOR;
            }
            total += value;
        }
        total
    }
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentBackend for LexiconSentiment {
    fn backend_id(&self) -> &str {
        "lexicon"
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn classify(&self, text: &str) -> Result<SentimentScore, BackendError> {
        let polarity = self.polarity(text);
        let label = if polarity >= 0.0 { POSITIVE } else { NEGATIVE };
        Ok(SentimentScore {
            label: label.to_string(),
            score: logistic(polarity.abs()),
        })
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn parse_lexicon(contents: &str) -> Result<HashMap<String, f64>, String> {
    let mut weights = HashMap::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (word, weight) = line
            .rsplit_once('\t')
            .ok_or_else(|| format!("line {}: expected word<TAB>weight", lineno + 1))?;
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| format!("line {}: invalid weight '{}'", lineno + 1, weight.trim()))?;
        if !weight.is_finite() {
            return Err(format!("line {}: weight must be finite", lineno + 1));
        }
        weights.insert(word.trim().to_lowercase().replace('\'', ""), weight);
    }
    if weights.is_empty() {
        return Err("lexicon has no entries".to_string());
    }
    Ok(weights)
}
