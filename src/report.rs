use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a polling cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// One reply was posted.
    Replied,
    /// Every candidate was processed, ineligible or without a usable reply.
    NoReply,
    /// A reply hit the platform rate limit; the item stays eligible.
    RateLimited,
    /// The listing could not be fetched.
    FetchFailed,
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Replied => write!(f, "replied"),
            CycleOutcome::NoReply => write!(f, "no reply"),
            CycleOutcome::RateLimited => write!(f, "rate limited"),
            CycleOutcome::FetchFailed => write!(f, "fetch failed"),
        }
    }
}

/// Structured record produced at the end of each polling cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub subreddit: String,
    pub outcome: CycleOutcome,
    pub scanned: u32,
    pub already_processed: u32,
    pub ineligible: u32,
    pub no_suitable_reply: u32,
    /// Items marked processed after a permanent or unknown failure.
    pub skipped_after_failure: u32,
    pub replied_to: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl CycleReport {
    pub fn start(subreddit: &str) -> Self {
        let now = Utc::now();
        Self {
            cycle_id: Uuid::new_v4().to_string(),
            subreddit: subreddit.to_string(),
            outcome: CycleOutcome::NoReply,
            scanned: 0,
            already_processed: 0,
            ineligible: 0,
            no_suitable_reply: 0,
            skipped_after_failure: 0,
            replied_to: None,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
        }
    }

    /// Stamp completion time and duration.
    pub fn finish(mut self) -> Self {
        self.completed_at = Utc::now();
        self.duration_ms = (self.completed_at - self.started_at).num_milliseconds();
        self
    }
}
