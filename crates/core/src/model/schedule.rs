use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::scheduler::{INITIAL_EASE_FACTOR, MASTERY_REPETITIONS};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Out-of-range performance inputs. These are rejected, never clamped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score must be between 0 and 100, got {0}")]
    InvalidScore(u8),

    #[error("quality must be between 0 and 5, got {0}")]
    InvalidQuality(u8),
}

//
// ─── SCORE & QUALITY ───────────────────────────────────────────────────────────
//

/// Session score in `0..=100`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    /// # Errors
    ///
    /// Returns `ScoreError::InvalidScore` if `value > 100`.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > Self::MAX {
            return Err(ScoreError::InvalidScore(value));
        }
        Ok(Self(value))
    }

    /// Score for a computed total, capped at 100.
    #[must_use]
    pub fn saturating(raw: u32) -> Self {
        match u8::try_from(raw) {
            Ok(value) if value <= Self::MAX => Self(value),
            _ => Self(Self::MAX),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(value: Score) -> Self {
        value.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// SM-2 recall quality in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;
    /// Lowest quality that counts as a successful recall.
    pub const PASS: u8 = 3;

    /// # Errors
    ///
    /// Returns `ScoreError::InvalidQuality` if `value > 5`.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > Self::MAX {
            return Err(ScoreError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    /// `floor(score / 20)`: 0-19 → 0, 60-79 → 3, 100 → 5.
    #[must_use]
    pub fn from_score(score: Score) -> Self {
        Self(score.value() / 20)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_pass(self) -> bool {
        self.0 >= Self::PASS
    }
}

//
// ─── SCHEDULE ENTRY ────────────────────────────────────────────────────────────
//

/// Spaced-repetition state for one question that has been reviewed at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Consecutive passing reviews; reset to 0 on a fail.
    pub repetitions: u32,
    /// Never below 1.3.
    pub ease_factor: f64,
    /// Days until `next_review`.
    pub interval: u32,
    pub next_review: DateTime<Utc>,
    pub times_practiced: u32,
    pub best_score: Score,
    #[serde(default)]
    pub last_practiced: Option<DateTime<Utc>>,
}

impl ScheduleEntry {
    /// Starting state for a question that has never been reviewed.
    #[must_use]
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            repetitions: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            next_review: now,
            times_practiced: 0,
            best_score: Score::default(),
            last_practiced: None,
        }
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.repetitions >= MASTERY_REPETITIONS
    }
}
