//! Profanity checkers
//!
//! The moderator consults an optional rich lexicon first and a small built-in
//! blocklist second. Both see text that is already lowercased and trimmed.

use std::collections::HashSet;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors raised by a profanity checker.
#[derive(Debug, Error)]
pub enum ProfanityCheckError {
    #[error("Failed to load lexicon {path}: {source}")]
    LexiconUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lexicon {0} contains no terms")]
    EmptyLexicon(String),

    #[error("Profanity check failed: {0}")]
    CheckFailed(String),
}

/// A source of profanity decisions.
pub trait ProfanityChecker: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether `text` contains profanity. `text` is lowercased and trimmed.
    fn contains_profanity(&self, text: &str) -> Result<bool, ProfanityCheckError>;
}

/// Substring blocklist. An empty list never matches.
#[derive(Debug, Clone, Default)]
pub struct BlocklistChecker {
    words: Vec<String>,
}

impl BlocklistChecker {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl ProfanityChecker for BlocklistChecker {
    fn name(&self) -> &'static str {
        "blocklist"
    }

    fn contains_profanity(&self, text: &str) -> Result<bool, ProfanityCheckError> {
        Ok(self.words.iter().any(|word| text.contains(word.as_str())))
    }
}

/// Word-list lexicon matched on whole words.
///
/// Single-word terms match any token of the text; multi-word terms match a run of
/// consecutive tokens.
#[derive(Debug, Clone)]
pub struct LexiconChecker {
    words: HashSet<String>,
    phrases: Vec<String>,
}

impl LexiconChecker {
    /// Build a lexicon from terms. Returns `EmptyLexicon` if no usable term remains.
    pub fn from_terms<I, S>(source: &str, terms: I) -> Result<Self, ProfanityCheckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = HashSet::new();
        let mut phrases = Vec::new();

        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() || term.starts_with('#') {
                continue;
            }
            let lowered = term.to_lowercase();
            let tokens = tokenize(&lowered);
            match tokens.as_slice() {
                [] => {}
                [word] => {
                    words.insert(word.to_string());
                }
                _ => phrases.push(tokens.join(" ")),
            }
        }

        if words.is_empty() && phrases.is_empty() {
            return Err(ProfanityCheckError::EmptyLexicon(source.to_string()));
        }

        Ok(Self { words, phrases })
    }

    /// Load a lexicon file with one term per line. `#` starts a comment line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfanityCheckError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents =
            fs::read_to_string(path).map_err(|source| ProfanityCheckError::LexiconUnavailable {
                path: display.clone(),
                source,
            })?;
        Self::from_terms(&display, contents.lines())
    }

    pub fn len(&self) -> usize {
        self.words.len() + self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfanityChecker for LexiconChecker {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn contains_profanity(&self, text: &str) -> Result<bool, ProfanityCheckError> {
        let tokens = tokenize(text);
        if tokens.iter().any(|t| self.words.contains(*t)) {
            return Ok(true);
        }
        if self.phrases.is_empty() {
            return Ok(false);
        }
        let padded = format!(" {} ", tokens.join(" "));
        Ok(self
            .phrases
            .iter()
            .any(|phrase| padded.contains(&format!(" {} ", phrase))))
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .collect()
}
