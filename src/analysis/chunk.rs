//! Character-window chunking for bounded-input backends.

/// Split `text` into contiguous, non-overlapping slices of at most
/// `max_chars` characters (not bytes).
///
/// Produces `ceil(chars / max_chars)` chunks whose concatenation is `text`.
/// Boundaries fall on character positions, so a chunk may end mid-word.
pub fn chunk_chars(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count_is_ceiling() {
        let text = "a".repeat(2500);
        let chunks = chunk_chars(&text, 1024);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1024);
        assert_eq!(chunks[2].len(), 452);

        assert_eq!(chunk_chars(&"b".repeat(2048), 1024).len(), 2);
        assert_eq!(chunk_chars("short", 1024), vec!["short"]);
        assert!(chunk_chars("", 1024).is_empty());
    }

    #[test]
    fn test_chunks_concatenate_to_input() {
        let text = "héllo wörld, ünïcode ✓ text";
        for size in [1, 2, 5, 7, 100] {
            let chunks = chunk_chars(text, size);
            assert_eq!(chunks.concat(), text);
            assert!(chunks.iter().all(|c| c.chars().count() <= size));
            let expected = text.chars().count().div_ceil(size);
            assert_eq!(chunks.len(), expected);
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
