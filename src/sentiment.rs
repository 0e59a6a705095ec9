use std::fmt;

use serde::{Deserialize, Serialize};

/// Overall tone of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Negative,
    Neutral,
    Positive,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Negative => write!(f, "negative"),
            Tone::Neutral => write!(f, "neutral"),
            Tone::Positive => write!(f, "positive"),
        }
    }
}

/// Score at or beyond which text counts as clearly positive or negative.
const TONE_THRESHOLD: i32 = 3;

/// Scores text sentiment using weighted keyword matching.
pub struct SentimentScorer;

impl SentimentScorer {
    /// Weighted keyword score over lowercase words. Positive means upbeat.
    pub fn score(text: &str) -> i32 {
        let lower = text.to_lowercase();

        let weighted: &[(&str, i32)] = &[
            ("love", 3),
            ("amazing", 3),
            ("awesome", 3),
            ("great", 2),
            ("thank", 2),
            ("happy", 2),
            ("excited", 2),
            ("congrat", 3),
            ("proud", 2),
            ("good", 1),
            ("nice", 1),
            ("hate", -3),
            ("awful", -3),
            ("terrible", -3),
            ("worst", -3),
            ("depressed", -3),
            ("angry", -2),
            ("sad", -2),
            ("lonely", -2),
            ("scared", -2),
            ("bad", -1),
            ("broke", -1),
            ("tired", -1),
        ];

        let mut score = 0;
        for word in lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
        {
            for &(keyword, weight) in weighted {
                if word.starts_with(keyword) {
                    score += weight;
                    break;
                }
            }
        }

        // Exclamation marks amplify whichever way the text already leans.
        let bangs = lower.matches('!').count().min(3) as i32;
        score + score.signum() * bangs
    }

    pub fn tone_of(score: i32) -> Tone {
        if score >= TONE_THRESHOLD {
            Tone::Positive
        } else if score <= -TONE_THRESHOLD {
            Tone::Negative
        } else {
            Tone::Neutral
        }
    }

    /// Score and tone of a title plus body.
    pub fn analyse(title: &str, body: &str) -> (i32, Tone) {
        let score = Self::score(&format!("{title}\n{body}"));
        (score, Self::tone_of(score))
    }
}
