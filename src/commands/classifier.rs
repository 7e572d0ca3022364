//! Tiered transcript classifier
//!
//! Tiers, highest precedence first:
//! 1. Exact: the normalized transcript equals a phrase
//! 2. Phrase: a multi-word phrase occurs inside the transcript
//! 3. Token: every phrase token contains, or is contained by, some
//!    transcript token
//!
//! Precision tiers run to completion over the whole catalog before the
//! looser tier is consulted.

use std::fmt;

use tracing::debug;

use super::action::ActionId;
use super::catalog::CommandCatalog;

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Phrase,
    Token,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::Phrase => write!(f, "phrase"),
            MatchTier::Token => write!(f, "token"),
        }
    }
}

/// A successful classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: ActionId,
    pub tier: MatchTier,
    /// Catalog phrase that matched
    pub phrase: String,
}

/// Maps transcripts to actions using a fixed catalog
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    catalog: CommandCatalog,
}

impl Classifier {
    pub fn new(catalog: CommandCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Resolve a transcript to an action, or `None` when nothing matches
    pub fn classify(&self, text: &str) -> Option<ActionId> {
        self.classify_detailed(text).map(|c| c.action)
    }

    /// Like [`classify`](Self::classify) but also reports tier and phrase
    pub fn classify_detailed(&self, text: &str) -> Option<Classification> {
        let normalized = text.trim().to_lowercase();

        // Token containment against one character matches nearly everything.
        if normalized.chars().count() < 2 {
            debug!(input = %normalized, "input too short to classify");
            return None;
        }

        let found = self
            .exact(&normalized)
            .or_else(|| self.phrase(&normalized))
            .or_else(|| self.token(&normalized));

        match &found {
            Some(c) => debug!(action = %c.action, tier = %c.tier, phrase = %c.phrase, "transcript classified"),
            None => debug!(input = %normalized, "no matching command"),
        }
        found
    }

    fn exact(&self, input: &str) -> Option<Classification> {
        self.catalog
            .phrases()
            .find(|(_, phrase)| *phrase == input)
            .map(|(action, phrase)| hit(action, MatchTier::Exact, phrase))
    }

    fn phrase(&self, input: &str) -> Option<Classification> {
        self.catalog
            .phrases()
            .find(|(_, phrase)| phrase.split_whitespace().count() >= 2 && input.contains(phrase))
            .map(|(action, phrase)| hit(action, MatchTier::Phrase, phrase))
    }

    fn token(&self, input: &str) -> Option<Classification> {
        let input_tokens: Vec<&str> = input.split_whitespace().collect();
        if input_tokens.is_empty() {
            return None;
        }

        self.catalog
            .phrases()
            .find(|(_, phrase)| {
                phrase.split_whitespace().all(|word| {
                    input_tokens
                        .iter()
                        .any(|token| token.contains(word) || word.contains(token))
                })
            })
            .map(|(action, phrase)| hit(action, MatchTier::Token, phrase))
    }
}

fn hit(action: ActionId, tier: MatchTier, phrase: &str) -> Classification {
    Classification {
        action,
        tier,
        phrase: phrase.to_string(),
    }
}
