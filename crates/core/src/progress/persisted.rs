use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{AggregateStats, QuestionId, ScheduleEntry, SessionRecord};

/// Boundary shape of a user's progress, as written after every transition.
///
/// `stats` is carried for readers that only want totals; restoring a store
/// re-derives it from `schedule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedProgress {
    pub schedule: BTreeMap<QuestionId, ScheduleEntry>,
    /// Most recent first.
    pub history: Vec<SessionRecord>,
    pub streak: u32,
    pub stats: AggregateStats,
}

impl PersistedProgress {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty() && self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let parsed: PersistedProgress = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.streak, 0);
    }

    #[test]
    fn schedule_keys_serialize_as_strings() {
        let mut progress = PersistedProgress::default();
        progress.schedule.insert(
            QuestionId::new("7").unwrap(),
            ScheduleEntry::new_at(crate::time::fixed_now()),
        );
        let json = serde_json::to_value(&progress).unwrap();
        assert!(json["schedule"]["7"]["ease_factor"].is_number());

        let back: PersistedProgress = serde_json::from_value(json).unwrap();
        assert_eq!(back, progress);
    }
}
