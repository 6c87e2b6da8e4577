use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::model::{Question, QuestionCatalog, QuestionId, ScheduleEntry};

/// Questions that are new or whose `next_review <= now`, in catalog order.
///
/// Always a full scan of the catalog; callers recompute instead of patching a
/// previous result.
#[must_use]
pub fn compute_due_questions<'a>(
    catalog: &'a QuestionCatalog,
    schedule: &BTreeMap<QuestionId, ScheduleEntry>,
    now: DateTime<Utc>,
) -> Vec<&'a Question> {
    catalog
        .iter()
        .filter(|q| schedule.get(&q.id).is_none_or(|entry| entry.is_due(now)))
        .collect()
}
