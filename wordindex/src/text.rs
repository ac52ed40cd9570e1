//! Line normalization shared by the index builders and the query runners.
use once_cell::sync::Lazy;
use regex::Regex;

// Runs over the lowercased text, so only ASCII letters and digits survive
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Lowercases `text`, turns every run of characters other than ASCII letters
/// and digits into one space and trims the result.
pub fn clean(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_WORD.replace_all(&lowered, " ").trim().to_string()
}

/// Cleans `text` and splits it into non-empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    clean(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean("  Hello, World!  "), "hello world");
        assert_eq!(clean("snake_case_name"), "snake case name");
        assert_eq!(clean("tabs\tand\n\nnewlines"), "tabs and newlines");
        assert_eq!(clean("--- ..."), "");
        assert_eq!(clean("Café über"), "caf ber");
        assert_eq!(clean("naïve"), "na ve");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("The cat's hat"), vec!["the", "cat", "s", "hat"]);
        assert_eq!(tokenize("  MIXED   case  "), vec!["mixed", "case"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("?!").is_empty());
        assert_eq!(tokenize("route66 is_open"), vec!["route66", "is", "open"]);
        assert_eq!(tokenize("Café über"), vec!["caf", "ber"]);
        assert!(tokenize("日本語").is_empty());
    }
}
