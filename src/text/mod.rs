//! Text cleanup and truncation for annotation strings.
//!
//! Scraped UI text carries every flavour of Unicode space (non-breaking,
//! zero-width, ideographic, line/paragraph separators). It is collapsed to a
//! single ASCII space before any length rule looks at it.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of space-like characters, including zero-width marks
    static ref RE_SPACE_RUN: Regex = Regex::new(concat!(
        r"[\x{0020}\x{00A0}\x{202F}\x{FEFF}\x{205F}\x{3000}",
        r"\x{2000}-\x{200B}\x{200E}-\x{200F}\x{2028}-\x{2029}\x{2060}-\x{2064}",
        r"\s]+"
    ))
    .unwrap();
}

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = " ...";

/// Collapse every run of space-like characters into one ASCII space.
///
/// # Examples
///
/// ```
/// use ui_corpus::text::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("Sign\u{00A0}\u{200B}in"), "Sign in");
/// assert_eq!(normalize_whitespace("a\n\n b"), "a b");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    RE_SPACE_RUN.replace_all(text, " ").into_owned()
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cut `text` to `max_len` characters, appending [`ELLIPSIS`] if anything was cut.
pub fn truncate_len(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_len).collect();
        head + ELLIPSIS
    }
}

/// Keep the first `max_words` words, appending [`ELLIPSIS`] if anything was cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        text.to_string()
    } else {
        words[..max_words].join(" ") + ELLIPSIS
    }
}

/// Apply a word limit and then a character limit.
///
/// Text within both limits is returned trimmed. Otherwise the first
/// `max_words` words are joined with single spaces, cut to `max_len`
/// characters, trimmed, and suffixed with [`ELLIPSIS`].
///
/// # Examples
///
/// ```
/// use ui_corpus::text::truncate_text;
///
/// assert_eq!(truncate_text(" Home ", 30, 300), "Home");
/// assert_eq!(truncate_text("a b c d e", 3, 100), "a b c ...");
/// assert_eq!(truncate_text("abcdefghij", 100, 5), "abcde ...");
/// ```
pub fn truncate_text(text: &str, max_words: usize, max_len: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words && text.chars().count() <= max_len {
        return text.trim().to_string();
    }
    let joined = words[..words.len().min(max_words)].join(" ");
    let cut: String = joined.chars().take(max_len).collect();
    format!("{}{}", cut.trim(), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_exotic_spaces() {
        let input = "a\u{3000}b\u{2028}c\u{FEFF}\u{2060}d\u{202F}e";
        assert_eq!(normalize_whitespace(input), "a b c d e");
    }

    #[test]
    fn test_normalize_whitespace_keeps_plain_text() {
        assert_eq!(normalize_whitespace("Add to cart"), "Add to cart");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_normalize_whitespace_leading_trailing() {
        assert_eq!(normalize_whitespace("\t Menu \u{00A0}"), " Menu ");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one  two\tthree"), 3);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_truncate_len() {
        assert_eq!(truncate_len("short", 10), "short");
        assert_eq!(truncate_len("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_len("this is longer", 4), "this ...");
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one two", 5), "one two");
        assert_eq!(truncate_words("a b c d e f", 2), "a b ...");
    }

    #[test]
    fn test_truncate_text_word_limit_binds() {
        assert_eq!(truncate_text("a b c d e", 3, 100), "a b c ...");
    }

    #[test]
    fn test_truncate_text_char_limit_binds() {
        assert_eq!(truncate_text("abcdefghij", 100, 5), "abcde ...");
    }

    #[test]
    fn test_truncate_text_both_limits() {
        // Word cut first, then the char cut on the joined words
        assert_eq!(truncate_text("hello world foo bar", 3, 8), "hello wo ...");
    }

    #[test]
    fn test_truncate_text_trims_before_ellipsis() {
        assert_eq!(truncate_text("abcd efgh", 1, 100), "abcd ...");
        assert_eq!(truncate_text("abc defgh ijk", 5, 4), "abc ...");
    }

    #[test]
    fn test_truncate_text_multibyte() {
        assert_eq!(truncate_text("日本語のテキスト", 10, 3), "日本語 ...");
    }
}
