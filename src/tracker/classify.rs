use std::fmt;

use serde::{Deserialize, Serialize};

/// How the bot should treat an item after a remote action on it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureClassification {
    /// Transient failure (rate limiting). Leave the item unprocessed and back off.
    Retryable,
    /// The item can never succeed (deleted, locked, too old).
    PermanentSkip,
    /// No known marker matched. Handled like `PermanentSkip`.
    Unknown,
}

impl FailureClassification {
    /// Whether the failed item should be recorded as processed.
    ///
    /// Only `Retryable` keeps an item eligible; everything else is marked so the
    /// loop never retries the same item forever.
    pub fn marks_processed(&self) -> bool {
        !matches!(self, FailureClassification::Retryable)
    }
}

impl fmt::Display for FailureClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClassification::Retryable => write!(f, "retryable"),
            FailureClassification::PermanentSkip => write!(f, "permanent-skip"),
            FailureClassification::Unknown => write!(f, "unknown"),
        }
    }
}

/// Known error markers and their classification. Checked in order.
const RULES: &[(&str, FailureClassification)] = &[
    ("RATELIMIT", FailureClassification::Retryable),
    ("DELETED_COMMENT", FailureClassification::PermanentSkip),
    ("TOO_OLD", FailureClassification::PermanentSkip),
    ("THREAD_LOCKED", FailureClassification::PermanentSkip),
    ("COMMENT_DELETED", FailureClassification::PermanentSkip),
    ("NOT_AUTHOR", FailureClassification::PermanentSkip),
    ("PARENT_DELETED", FailureClassification::PermanentSkip),
];

/// Classify a free-text error signal by case-insensitive substring match.
pub fn classify(signal: &str) -> FailureClassification {
    let upper = signal.to_uppercase();
    RULES
        .iter()
        .find(|(marker, _)| upper.contains(marker))
        .map(|&(_, class)| class)
        .unwrap_or(FailureClassification::Unknown)
}
