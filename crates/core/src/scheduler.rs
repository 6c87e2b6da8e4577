use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{Quality, ScheduleEntry, Score};

/// Ease factor assigned to a question on its first review.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
/// Floor for the ease factor; no run of failures pushes it lower.
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Consecutive passes after which a question counts as mastered.
pub const MASTERY_REPETITIONS: u32 = 5;

const FIRST_PASS_INTERVAL: u32 = 1;
const SECOND_PASS_INTERVAL: u32 = 6;
const FAIL_INTERVAL: u32 = 1;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("ease factor must be finite and at least {MIN_EASE_FACTOR}, got {provided}")]
    InvalidEaseFactor { provided: f64 },
    #[error("interval of {days} days does not fit in the calendar")]
    IntervalOverflow { days: u32 },
}

//
// ─── SCHEDULE RESULT ───────────────────────────────────────────────────────────
//

/// Output of one SM-2 step.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleResult {
    pub interval: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
}

//
// ─── SM-2 ──────────────────────────────────────────────────────────────────────
//

/// One SM-2 step.
///
/// A pass (`quality >= 3`) bumps `repetitions` and grows the interval
/// 1 → 6 → `round(previous_interval * ease_factor)`, multiplying by the
/// incoming ease factor. A fail resets to `repetitions = 0`, `interval = 1`.
/// The ease factor is adjusted on every review and floored at
/// [`MIN_EASE_FACTOR`].
///
/// # Errors
///
/// - `InvalidEaseFactor` if `ease_factor` is not finite or is below the floor
/// - `IntervalOverflow` if `now + interval` leaves the representable date range
///
/// # Examples
///
/// ```
/// # use prep_core::model::Quality;
/// # use prep_core::scheduler::compute_next_schedule;
/// let now = chrono::Utc::now();
/// let next = compute_next_schedule(Quality::new(4)?, 6, 2, 2.5, now)?;
/// assert_eq!(next.interval, 15);
/// assert_eq!(next.repetitions, 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute_next_schedule(
    quality: Quality,
    previous_interval: u32,
    repetitions: u32,
    ease_factor: f64,
    now: DateTime<Utc>,
) -> Result<ScheduleResult, SchedulerError> {
    if !ease_factor.is_finite() || ease_factor < MIN_EASE_FACTOR {
        return Err(SchedulerError::InvalidEaseFactor {
            provided: ease_factor,
        });
    }

    let (interval, repetitions) = if quality.is_pass() {
        let interval = match repetitions {
            0 => FIRST_PASS_INTERVAL,
            1 => SECOND_PASS_INTERVAL,
            // float -> int casts saturate, so huge products pin to u32::MAX
            _ => (f64::from(previous_interval) * ease_factor).round() as u32,
        };
        (interval, repetitions.saturating_add(1))
    } else {
        (FAIL_INTERVAL, 0)
    };

    let miss = f64::from(Quality::MAX - quality.value());
    let ease_factor = (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);

    let next_review = Duration::try_days(i64::from(interval))
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(SchedulerError::IntervalOverflow { days: interval })?;

    Ok(ScheduleResult {
        interval,
        ease_factor,
        repetitions,
        next_review,
    })
}

/// Result of applying a scored session to a question's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedReview {
    pub quality: Quality,
    pub result: ScheduleResult,
    pub entry: ScheduleEntry,
}

/// SM-2 scheduler operating on whole [`ScheduleEntry`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply a session score to the previous entry (or a fresh one) and return
    /// the merged entry.
    ///
    /// The merged entry has `times_practiced` incremented, `best_score` raised
    /// to the max, and `last_practiced` set to `reviewed_at`.
    ///
    /// # Errors
    ///
    /// Propagates `SchedulerError` from [`compute_next_schedule`].
    pub fn apply_review(
        &self,
        previous: Option<&ScheduleEntry>,
        score: Score,
        reviewed_at: DateTime<Utc>,
    ) -> Result<AppliedReview, SchedulerError> {
        let base = previous
            .cloned()
            .unwrap_or_else(|| ScheduleEntry::new_at(reviewed_at));
        let quality = Quality::from_score(score);

        let result = compute_next_schedule(
            quality,
            base.interval,
            base.repetitions,
            base.ease_factor,
            reviewed_at,
        )?;

        let entry = ScheduleEntry {
            repetitions: result.repetitions,
            ease_factor: result.ease_factor,
            interval: result.interval,
            next_review: result.next_review,
            times_practiced: base.times_practiced.saturating_add(1),
            best_score: base.best_score.max(score),
            last_practiced: Some(reviewed_at),
        };

        Ok(AppliedReview {
            quality,
            result,
            entry,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
