//! Progress reducer: schedule map, bounded session history, streak and
//! derived aggregates for a single user.

mod due;
mod persisted;
mod store;
mod streak;

pub use due::compute_due_questions;
pub use persisted::PersistedProgress;
pub use store::{HISTORY_LIMIT, ProgressError, ProgressSnapshot, ProgressStore};
pub use streak::next_streak;
