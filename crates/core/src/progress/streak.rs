use chrono::{DateTime, FixedOffset, Utc};

use crate::time::calendar_day;

/// Streak after completing a session at `now`.
///
/// `last_session_end` is the end time of the most recent session before this
/// one. Same calendar day keeps the streak, the previous day extends it, and
/// anything older (or no prior session at all) restarts it at 1.
#[must_use]
pub fn next_streak(
    last_session_end: Option<DateTime<Utc>>,
    current: u32,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> u32 {
    let Some(last) = last_session_end else {
        return 1;
    };

    let last_day = calendar_day(last, offset);
    let today = calendar_day(now, offset);

    if last_day == today {
        current
    } else if today.pred_opt() == Some(last_day) {
        current.saturating_add(1)
    } else {
        1
    }
}
