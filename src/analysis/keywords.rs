//! Keyword frequency extraction.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::stopwords::is_stop_word;
use crate::models::KeywordEntry;

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("valid word regex"))
}

/// Lowercased alphanumeric tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| token.chars().all(char::is_alphanumeric))
        .map(str::to_string)
        .collect()
}

/// Tokens that are not stop words.
pub fn content_words(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !is_stop_word(token))
        .collect()
}

/// The `top_n` most frequent content words, by count descending.
///
/// Equal counts keep the order in which the words first appear.
pub fn top_keywords(text: &str, top_n: usize) -> Vec<KeywordEntry> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, word) in content_words(text).into_iter().enumerate() {
        counts.entry(word).or_insert((0, idx)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by_key(|(_, count, first)| (Reverse(*count), *first));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(word, count, _)| KeywordEntry::new(word, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Don't STOP, e-mail café_bar 42!"),
            vec!["don", "t", "stop", "e", "mail", "42"]
        );
    }

    #[test]
    fn test_top_keywords_counts_and_ties() {
        let entries = top_keywords("the cat sat on the mat the cat ran", 2);
        assert_eq!(
            entries,
            vec![KeywordEntry::new("cat", 2), KeywordEntry::new("sat", 1)]
        );

        let all = top_keywords("the cat sat on the mat the cat ran", 10);
        let words: Vec<_> = all.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["cat", "sat", "mat", "ran"]);
    }

    #[test]
    fn test_case_folding_and_stop_words() {
        let entries = top_keywords("Budget budget BUDGET and the Plan", 10);
        assert_eq!(
            entries,
            vec![KeywordEntry::new("budget", 3), KeywordEntry::new("plan", 1)]
        );
    }

    #[test]
    fn test_limits() {
        assert!(top_keywords("the and of", 10).is_empty());
        assert!(top_keywords("", 10).is_empty());
        assert!(top_keywords("alpha beta", 0).is_empty());
        assert!(top_keywords("one two three four", 3).len() <= 3);
    }
}
