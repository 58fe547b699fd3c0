//! Content moderation for user-authored text
//!
//! Titles, descriptions and comments are evaluated before they are stored. Rules run
//! in a fixed order and the first one that triggers decides the verdict:
//!
//! 1. profanity (rich lexicon when available, otherwise the built-in blocklist)
//! 2. hate speech patterns
//! 3. excessive capitalization
//! 4. repeated-character spam
//!
//! Evaluation never fails. A failing profanity checker is logged and treated as
//! "no match".

pub mod profanity;
pub mod rules;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
pub use profanity::{BlocklistChecker, LexiconChecker, ProfanityCheckError, ProfanityChecker};

/// Why a piece of text was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    None,
    Profanity,
    HateSpeech,
    ExcessiveCaps,
    SpamPattern,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::None => "none",
            ReasonCode::Profanity => "profanity",
            ReasonCode::HateSpeech => "hate_speech",
            ReasonCode::ExcessiveCaps => "excessive_caps",
            ReasonCode::SpamPattern => "spam_pattern",
        }
    }

    /// User-facing rejection message for a field, or `None` for [`ReasonCode::None`].
    pub fn message(&self, field_name: &str) -> Option<String> {
        let message = match self {
            ReasonCode::None => return None,
            ReasonCode::Profanity => format!(
                "Your {} contains inappropriate language. Please use respectful and community-friendly language.",
                field_name
            ),
            ReasonCode::HateSpeech => format!(
                "Your {} contains hate speech. Please be respectful to all members of our community.",
                field_name
            ),
            ReasonCode::ExcessiveCaps => format!(
                "Your {} contains excessive capitalization. Please use normal capitalization.",
                field_name
            ),
            ReasonCode::SpamPattern => format!(
                "Your {} appears to contain spam. Please provide meaningful content.",
                field_name
            ),
        };
        Some(message)
    }

    /// Short issue line, independent of the field.
    pub fn issue(&self) -> Option<&'static str> {
        match self {
            ReasonCode::None => None,
            ReasonCode::Profanity => Some("Profanity is not allowed. Please use respectful language."),
            ReasonCode::HateSpeech => {
                Some("Hate speech is not allowed. Please be respectful to others.")
            }
            ReasonCode::ExcessiveCaps => Some("Please avoid using excessive capitalization."),
            ReasonCode::SpamPattern => Some("Spam-like patterns are not allowed."),
        }
    }
}

impl Display for ReasonCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one text field.
///
/// `rejected` is true exactly when `reason` is not [`ReasonCode::None`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub rejected: bool,
    pub reason: ReasonCode,
    pub message: String,
}

impl ModerationVerdict {
    pub fn accepted() -> Self {
        Self {
            rejected: false,
            reason: ReasonCode::None,
            message: String::new(),
        }
    }

    pub fn rejected(reason: ReasonCode, field_name: &str) -> Self {
        match reason.message(field_name) {
            Some(message) => Self {
                rejected: true,
                reason,
                message,
            },
            None => Self::accepted(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        !self.rejected
    }
}

/// Heuristic moderator for titles, descriptions and comments.
///
/// Cheap to clone and safe to share between request handlers.
#[derive(Debug, Clone, Default)]
pub struct ContentModerator {
    lexicon: Option<Arc<dyn ProfanityChecker>>,
    blocklist: BlocklistChecker,
}

impl ContentModerator {
    /// Moderator with only the built-in blocklist.
    pub fn new(blocklist: BlocklistChecker) -> Self {
        Self {
            lexicon: None,
            blocklist,
        }
    }

    /// Add a rich profanity checker. The blocklist is only consulted if it fails.
    pub fn with_lexicon(mut self, checker: Arc<dyn ProfanityChecker>) -> Self {
        self.lexicon = Some(checker);
        self
    }

    /// Build from configuration, probing for the lexicon file.
    ///
    /// A missing or unusable lexicon leaves the blocklist as the only profanity source.
    pub fn from_config(config: &Config) -> Self {
        let moderator = Self::new(BlocklistChecker::new(&config.profanity_blocklist));

        let Some(path) = config.profanity_wordlist_path.as_deref() else {
            tracing::info!(
                blocklist_empty = moderator.blocklist.is_empty(),
                "No profanity lexicon configured, using built-in blocklist"
            );
            return moderator;
        };

        match LexiconChecker::from_file(path) {
            Ok(lexicon) => {
                tracing::info!(path = %path, terms = lexicon.len(), "Profanity lexicon loaded");
                moderator.with_lexicon(Arc::new(lexicon))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "Profanity lexicon unavailable, using built-in blocklist"
                );
                moderator
            }
        }
    }

    pub fn has_lexicon(&self) -> bool {
        self.lexicon.is_some()
    }

    /// Evaluate `text` for the field `field_name` ("title", "description", "comment").
    ///
    /// Empty and absent text is always accepted.
    pub fn evaluate<'a>(&self, text: impl Into<Option<&'a str>>, field_name: &str) -> ModerationVerdict {
        match self.classify(text.into()) {
            ReasonCode::None => ModerationVerdict::accepted(),
            reason => {
                tracing::debug!(field = %field_name, reason = %reason, "Content rejected");
                ModerationVerdict::rejected(reason, field_name)
            }
        }
    }

    /// `Ok(())` when accepted, otherwise the user-facing message.
    pub fn validate<'a>(&self, text: impl Into<Option<&'a str>>, field_name: &str) -> Result<(), String> {
        let verdict = self.evaluate(text, field_name);
        if verdict.rejected {
            Err(verdict.message)
        } else {
            Ok(())
        }
    }

    /// Short issue lines for `text`; empty when accepted.
    pub fn issues<'a>(&self, text: impl Into<Option<&'a str>>) -> Vec<String> {
        self.classify(text.into())
            .issue()
            .map(|issue| vec![issue.to_string()])
            .unwrap_or_default()
    }

    fn classify(&self, text: Option<&str>) -> ReasonCode {
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return ReasonCode::None,
        };

        if self.contains_profanity(text) {
            return ReasonCode::Profanity;
        }
        if rules::contains_hate_speech(text) {
            return ReasonCode::HateSpeech;
        }
        if rules::has_excessive_caps(text) {
            return ReasonCode::ExcessiveCaps;
        }
        if rules::has_spam_pattern(text) {
            return ReasonCode::SpamPattern;
        }
        ReasonCode::None
    }

    fn contains_profanity(&self, text: &str) -> bool {
        let normalized = text.trim().to_lowercase();

        if let Some(lexicon) = &self.lexicon {
            match lexicon.contains_profanity(&normalized) {
                Ok(found) => return found,
                Err(e) => {
                    tracing::error!(
                        checker = lexicon.name(),
                        error = %e,
                        "Profanity checker failed, falling back to blocklist"
                    );
                }
            }
        }

        self.blocklist
            .contains_profanity(&normalized)
            .unwrap_or(false)
    }
}
