//! Text normalization for the bag-of-words model.
//!
//! URLs and every non-letter character are dropped, the remainder is
//! lowercased and each whitespace-separated token is Porter-stemmed.

pub mod porter;

use regex::Regex;
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+").expect("valid URL regex"));
static NON_LETTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid letter regex"));

/// Normalize raw post text into space-joined stemmed tokens.
///
/// Pure and infallible: empty or fully stripped input yields `""`.
pub fn normalize(text: &str) -> String {
    let without_urls = URL_REGEX.replace_all(text, "");
    let letters_only = NON_LETTER_REGEX.replace_all(&without_urls, "");
    let lowered = letters_only.to_ascii_lowercase();

    lowered
        .split_whitespace()
        .map(porter::stem)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a batch, preserving order.
pub fn normalize_all<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    texts.iter().map(|t| normalize(t.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_is_deterministic() {
        let text = "Loving the new release!!! 🚀 https://t.co/abc #rustlang";
        assert_eq!(normalize(text), normalize(text));
    }

    #[test]
    fn test_urls_removed() {
        let out = normalize("check http://x.co now");
        assert!(!out.contains("http"));
        assert!(out.chars().all(|c| c.is_ascii_lowercase() || c == ' '));
        assert_eq!(out, "check now");
    }

    #[test]
    fn test_www_urls_removed() {
        assert_eq!(normalize("visit www.example.com/page today"), "visit today");
    }

    #[test]
    fn test_stemming_shares_prefix() {
        let out = normalize("running runs runner");
        let tokens: Vec<&str> = out.split(' ').collect();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.starts_with("run")), "{out}");
    }

    #[test]
    fn test_digits_punctuation_and_scripts_stripped() {
        assert_eq!(normalize("I <3 Rust, 100%!"), "i rust");
        assert_eq!(normalize("日本語 only"), "onli");
    }

    #[test]
    fn test_empty_and_fully_stripped_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n "), "");
        assert_eq!(normalize("123 !!! 🎉 https://t.co/x"), "");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("  love \n\n  this\t"), "love thi");
    }

    #[test]
    fn test_normalize_all_preserves_order() {
        let out = normalize_all(&["I love this!", "This is terrible."]);
        assert_eq!(out, vec!["i love thi".to_string(), "thi is terribl".to_string()]);
    }
}
