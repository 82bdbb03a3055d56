//! Text helpers shared by the AI call sites.

/// Truncate to at most `max` characters, respecting UTF-8 boundaries.
/// Byte-index slicing would panic on multi-byte content (page titles are
/// frequently non-ASCII).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_truncates_at_char_count() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn test_multibyte_safe() {
        let s = "日本語のタイトル";
        assert_eq!(truncate_chars(s, 3), "日本語");
        assert_eq!(truncate_chars(s, 100), s);
    }
}
