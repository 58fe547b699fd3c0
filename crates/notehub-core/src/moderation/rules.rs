//! Pattern and statistical rules used by the content moderator.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Threat and self-harm incitement phrases, matched case-insensitively.
///
/// Extend coverage by adding patterns here.
pub const HATE_SPEECH_PATTERNS: &[&str] = &[
    r"\b(kill|murder|die)\s+(yourself|urself|u)\b",
    r"\b(go\s+)?(kill|die)\s+(yourself|urself)\b",
    r"\bgo\s+die\b",
    r"\b(you|u)\s+should\s+die\b",
];

/// Texts of this many characters or fewer are never checked for capitalization.
pub const CAPS_MIN_LENGTH: usize = 10;

/// Uppercase fraction above which text counts as shouting.
pub const CAPS_RATIO_THRESHOLD: f64 = 0.7;

/// Consecutive repeats of one character that count as spam.
pub const SPAM_REPEAT_RUN: usize = 5;

static HATE_SPEECH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HATE_SPEECH_PATTERNS
        .iter()
        .filter_map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    tracing::error!(pattern = %pattern, error = %e, "Invalid hate speech pattern");
                })
                .ok()
        })
        .collect()
});

pub fn contains_hate_speech(text: &str) -> bool {
    HATE_SPEECH.iter().any(|re| re.is_match(text))
}

/// Uppercase letters over all characters, for text longer than [`CAPS_MIN_LENGTH`].
pub fn has_excessive_caps(text: &str) -> bool {
    let total = text.chars().count();
    if total <= CAPS_MIN_LENGTH {
        return false;
    }
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    upper as f64 / total as f64 > CAPS_RATIO_THRESHOLD
}

/// Any character other than a newline repeated [`SPAM_REPEAT_RUN`] or more times in a row.
pub fn has_spam_pattern(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            previous = None;
            run = 0;
            continue;
        }
        if previous == Some(c) {
            run += 1;
        } else {
            previous = Some(c);
            run = 1;
        }
        if run >= SPAM_REPEAT_RUN {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(HATE_SPEECH.len(), HATE_SPEECH_PATTERNS.len());
    }

    #[test]
    fn hate_speech_variants() {
        assert!(contains_hate_speech("go kill yourself"));
        assert!(contains_hate_speech("Just DIE URSELF"));
        assert!(contains_hate_speech("murder u"));
        assert!(contains_hate_speech("you should die"));
        assert!(contains_hate_speech("go   die"));
        assert!(!contains_hate_speech("this chapter will kill your grade"));
        assert!(!contains_hate_speech("studied until I could die of boredom"));
    }

    #[test]
    fn caps_needs_more_than_ten_characters() {
        assert!(!has_excessive_caps("ABCDEFGHIJ"));
        assert!(has_excessive_caps("ABCDEFGHIJK"));
        assert!(has_excessive_caps("THIS IS SO GREAT!!"));
        assert!(!has_excessive_caps("This Is A Title Case Sentence"));
    }

    #[test]
    fn caps_ratio_is_strictly_greater() {
        // 14 of 20
        assert!(!has_excessive_caps("ABCDEFGhijABCDEFGhij"));
        // 15 of 20
        assert!(has_excessive_caps("ABCDEFGHijABCDEFGhij"));
    }

    #[test]
    fn caps_counts_characters_not_bytes() {
        assert!(has_excessive_caps("ÉÉÉÉÉÉÉÉÉÉÉÉ"));
    }

    #[test]
    fn spam_needs_five_in_a_row() {
        assert!(has_spam_pattern("heyyyyy check my notes"));
        assert!(has_spam_pattern("!!!!!"));
        assert!(!has_spam_pattern("heyyyy"));
        assert!(!has_spam_pattern("aaaabaaaa"));
    }

    #[test]
    fn newlines_do_not_count_as_spam() {
        assert!(!has_spam_pattern("a\n\n\n\n\n\nb"));
        assert!(!has_spam_pattern("aaa\naaa"));
    }
}
