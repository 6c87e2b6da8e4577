use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Category, Difficulty, QuestionCatalog, QuestionId, ScheduleEntry};

/// Progress totals derived from the schedule map. Never mutated directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateStats {
    /// Distinct questions with a schedule entry.
    pub total_practiced: usize,
    pub total_questions: usize,
    /// Rounded mean of best scores; 0 when nothing has been practiced.
    pub average_score: u8,
    pub mastered: usize,
    pub streak: u32,
}

impl AggregateStats {
    #[must_use]
    pub fn derive(
        schedule: &BTreeMap<QuestionId, ScheduleEntry>,
        total_questions: usize,
        streak: u32,
    ) -> Self {
        Self {
            total_practiced: schedule.len(),
            total_questions,
            average_score: average_best_score(schedule.values()).unwrap_or(0),
            mastered: schedule.values().filter(|e| e.is_mastered()).count(),
            streak,
        }
    }
}

/// Per-category practice coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub total: usize,
    pub practiced: usize,
    pub mastered: usize,
    pub average_best_score: Option<u8>,
}

impl CategoryStats {
    /// One row per category, in `Category::ALL` order.
    #[must_use]
    pub fn breakdown(
        catalog: &QuestionCatalog,
        schedule: &BTreeMap<QuestionId, ScheduleEntry>,
    ) -> Vec<Self> {
        Category::ALL
            .into_iter()
            .map(|category| {
                let total = catalog.by_category(category).count();
                let entries: Vec<&ScheduleEntry> = catalog
                    .by_category(category)
                    .filter_map(|q| schedule.get(&q.id))
                    .collect();
                Self {
                    category,
                    total,
                    practiced: entries.len(),
                    mastered: entries.iter().filter(|e| e.is_mastered()).count(),
                    average_best_score: average_best_score(entries.into_iter()),
                }
            })
            .collect()
    }
}

/// Per-difficulty practice coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyStats {
    pub difficulty: Difficulty,
    pub total: usize,
    pub practiced: usize,
    pub average_best_score: Option<u8>,
}

impl DifficultyStats {
    /// One row per difficulty, easiest first.
    #[must_use]
    pub fn breakdown(
        catalog: &QuestionCatalog,
        schedule: &BTreeMap<QuestionId, ScheduleEntry>,
    ) -> Vec<Self> {
        Difficulty::ALL
            .into_iter()
            .map(|difficulty| {
                let total = catalog.by_difficulty(difficulty).count();
                let entries: Vec<&ScheduleEntry> = catalog
                    .by_difficulty(difficulty)
                    .filter_map(|q| schedule.get(&q.id))
                    .collect();
                Self {
                    difficulty,
                    total,
                    practiced: entries.len(),
                    average_best_score: average_best_score(entries.into_iter()),
                }
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn average_best_score<'a>(entries: impl Iterator<Item = &'a ScheduleEntry>) -> Option<u8> {
    let (sum, count) = entries.fold((0_u64, 0_u64), |(sum, count), e| {
        (sum + u64::from(e.best_score.value()), count + 1)
    });
    if count == 0 {
        return None;
    }
    // Every score is <= 100, so the mean fits in u8.
    Some((sum as f64 / count as f64).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, Score};
    use crate::time::fixed_now;

    fn entry(repetitions: u32, best: u8) -> ScheduleEntry {
        let mut e = ScheduleEntry::new_at(fixed_now());
        e.repetitions = repetitions;
        e.best_score = Score::new(best).unwrap();
        e
    }

    fn qid(id: &str) -> QuestionId {
        QuestionId::new(id).unwrap()
    }

    #[test]
    fn empty_schedule_has_zero_average() {
        let stats = AggregateStats::derive(&BTreeMap::new(), 10, 0);
        assert_eq!(stats.total_practiced, 0);
        assert_eq!(stats.average_score, 0);
        assert_eq!(stats.total_questions, 10);
    }

    #[test]
    fn mastery_counts_only_five_or_more() {
        let mut schedule = BTreeMap::new();
        schedule.insert(qid("1"), entry(6, 90));
        schedule.insert(qid("2"), entry(3, 70));

        let stats = AggregateStats::derive(&schedule, 2, 1);
        assert_eq!(stats.mastered, 1);
        assert_eq!(stats.total_practiced, 2);
        assert_eq!(stats.average_score, 80);
    }

    #[test]
    fn average_rounds_half_up() {
        let mut schedule = BTreeMap::new();
        schedule.insert(qid("1"), entry(0, 80));
        schedule.insert(qid("2"), entry(0, 81));
        assert_eq!(AggregateStats::derive(&schedule, 2, 0).average_score, 81);
    }

    #[test]
    fn breakdown_groups_by_catalog_category() {
        let catalog = QuestionCatalog::new(vec![
            Question::new(qid("1"), "A", Category::Api, Difficulty::Easy),
            Question::new(qid("2"), "B", Category::Api, Difficulty::Hard),
            Question::new(qid("3"), "C", Category::Caching, Difficulty::Hard),
        ])
        .unwrap();
        let mut schedule = BTreeMap::new();
        schedule.insert(qid("1"), entry(5, 60));

        let rows = CategoryStats::breakdown(&catalog, &schedule);
        assert_eq!(rows.len(), Category::ALL.len());

        let api = rows.iter().find(|r| r.category == Category::Api).unwrap();
        assert_eq!((api.total, api.practiced, api.mastered), (2, 1, 1));
        assert_eq!(api.average_best_score, Some(60));

        let caching = rows.iter().find(|r| r.category == Category::Caching).unwrap();
        assert_eq!(caching.average_best_score, None);
    }

    #[test]
    fn breakdown_groups_by_catalog_difficulty() {
        let catalog = QuestionCatalog::new(vec![
            Question::new(qid("1"), "A", Category::Api, Difficulty::Easy),
            Question::new(qid("2"), "B", Category::Caching, Difficulty::Hard),
            Question::new(qid("3"), "C", Category::Database, Difficulty::Hard),
        ])
        .unwrap();
        let mut schedule = BTreeMap::new();
        schedule.insert(qid("2"), entry(1, 70));
        schedule.insert(qid("3"), entry(2, 85));

        let rows = DifficultyStats::breakdown(&catalog, &schedule);
        let order: Vec<Difficulty> = rows.iter().map(|r| r.difficulty).collect();
        assert_eq!(order, Difficulty::ALL.to_vec());

        let hard = rows.iter().find(|r| r.difficulty == Difficulty::Hard).unwrap();
        assert_eq!((hard.total, hard.practiced), (2, 2));
        // (70 + 85) / 2 = 77.5 rounds up.
        assert_eq!(hard.average_best_score, Some(78));

        let easy = rows.iter().find(|r| r.difficulty == Difficulty::Easy).unwrap();
        assert_eq!((easy.total, easy.practiced, easy.average_best_score), (1, 0, None));

        let medium = rows.iter().find(|r| r.difficulty == Difficulty::Medium).unwrap();
        assert_eq!((medium.total, medium.practiced), (0, 0));
    }
}
