use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::due::compute_due_questions;
use super::persisted::PersistedProgress;
use super::streak::next_streak;
use crate::model::{
    ActiveSession, AggregateStats, CategoryStats, DifficultyStats, MessageRole, Question,
    QuestionCatalog, QuestionId, ScheduleEntry, Score, SessionMessage, SessionRecord,
};
use crate::scheduler::{MIN_EASE_FACTOR, Scheduler, SchedulerError};
use crate::time::Clock;

/// Completed sessions kept in history; older ones are evicted.
pub const HISTORY_LIMIT: usize = 50;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("question {0} is not in the catalog")]
    UnknownQuestion(QuestionId),

    #[error("no session in progress")]
    NoActiveSession,

    #[error("invalid persisted state: {0}")]
    InvalidPersistedState(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Everything the presentation layer needs to re-render after a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub schedule: BTreeMap<QuestionId, ScheduleEntry>,
    pub due: Vec<Question>,
    pub stats: AggregateStats,
    pub streak: u32,
    pub taken_at: DateTime<Utc>,
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Single-writer progress state for one user.
///
/// Owns the schedule map and session history. Every scoring transition goes
/// through [`ProgressStore::complete_session`], which either applies fully or
/// leaves the store untouched.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    catalog: Arc<QuestionCatalog>,
    scheduler: Scheduler,
    clock: Clock,
    day_offset: FixedOffset,
    schedule: BTreeMap<QuestionId, ScheduleEntry>,
    history: Vec<SessionRecord>,
    streak: u32,
    stats: AggregateStats,
    active: Option<ActiveSession>,
}

impl ProgressStore {
    /// Empty progress over the given catalog, using the system clock and UTC days.
    #[must_use]
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        let stats = AggregateStats::derive(&BTreeMap::new(), catalog.len(), 0);
        Self {
            catalog,
            scheduler: Scheduler::new(),
            clock: Clock::default(),
            day_offset: utc_offset(),
            schedule: BTreeMap::new(),
            history: Vec::new(),
            streak: 0,
            stats,
            active: None,
        }
    }

    /// Rebuild a store from persisted progress.
    ///
    /// History beyond [`HISTORY_LIMIT`] is dropped and stats are re-derived.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPersistedState` if an entry carries an
    /// ease factor below the floor or a non-finite one.
    pub fn restore(
        catalog: Arc<QuestionCatalog>,
        persisted: PersistedProgress,
    ) -> Result<Self, ProgressError> {
        for (id, entry) in &persisted.schedule {
            if !entry.ease_factor.is_finite() || entry.ease_factor < MIN_EASE_FACTOR {
                return Err(ProgressError::InvalidPersistedState(format!(
                    "question {id} has ease factor {}",
                    entry.ease_factor
                )));
            }
        }

        let PersistedProgress {
            schedule,
            mut history,
            streak,
            stats: _,
        } = persisted;
        history.truncate(HISTORY_LIMIT);

        let stats = AggregateStats::derive(&schedule, catalog.len(), streak);
        Ok(Self {
            schedule,
            history,
            streak,
            stats,
            ..Self::new(catalog)
        })
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Offset used to decide which calendar day a session falls on.
    #[must_use]
    pub fn with_day_offset(mut self, offset: FixedOffset) -> Self {
        self.day_offset = offset;
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedProgress {
        PersistedProgress {
            schedule: self.schedule.clone(),
            history: self.history.clone(),
            streak: self.streak,
            stats: self.stats,
        }
    }

    //
    // ─── IN-PROGRESS SESSION ───────────────────────────────────────────────────
    //

    /// Begin a session for `question_id`, replacing any session in progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownQuestion` if the id is not in the catalog.
    pub fn start_session(
        &mut self,
        question_id: &QuestionId,
    ) -> Result<&ActiveSession, ProgressError> {
        self.ensure_known(question_id)?;
        let session = ActiveSession::new(question_id.clone(), self.clock.now());
        Ok(&*self.active.insert(session))
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Append a transcript message to the session in progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NoActiveSession` if no session was started.
    pub fn add_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<(), ProgressError> {
        let now = self.clock.now();
        let active = self.active.as_mut().ok_or(ProgressError::NoActiveSession)?;
        active.push_message(SessionMessage::new(role, content, now));
        Ok(())
    }

    /// Replace the diagram markup of the session in progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NoActiveSession` if no session was started.
    pub fn set_diagram(&mut self, markup: impl Into<String>) -> Result<(), ProgressError> {
        let active = self.active.as_mut().ok_or(ProgressError::NoActiveSession)?;
        active.set_diagram(markup);
        Ok(())
    }

    /// Drop the session in progress without recording anything.
    pub fn abandon_session(&mut self) -> Option<ActiveSession> {
        self.active.take()
    }

    /// Forget all progress and any session in progress. Catalog, clock and
    /// day offset are kept.
    pub fn reset(&mut self) {
        self.schedule.clear();
        self.history.clear();
        self.streak = 0;
        self.active = None;
        self.stats = AggregateStats::derive(&self.schedule, self.catalog.len(), 0);
    }

    //
    // ─── TRANSITION ────────────────────────────────────────────────────────────
    //

    /// Score a session for `question_id` and fold it into progress.
    ///
    /// Reschedules the question, prepends the finished session to history
    /// (evicting beyond [`HISTORY_LIMIT`]), updates the streak, and re-derives
    /// stats. If a session for the same question is in progress it becomes the
    /// history record; otherwise a zero-length session is recorded.
    ///
    /// # Errors
    ///
    /// - `UnknownQuestion` if the id is not in the catalog
    /// - `Scheduler` if the stored entry cannot be rescheduled
    ///
    /// On error nothing is changed.
    pub fn complete_session(
        &mut self,
        question_id: &QuestionId,
        score: Score,
    ) -> Result<ProgressSnapshot, ProgressError> {
        self.ensure_known(question_id)?;
        let now = self.clock.now();

        let applied = self
            .scheduler
            .apply_review(self.schedule.get(question_id), score, now)?;
        let streak = next_streak(
            self.history.first().map(|s| s.ended_at),
            self.streak,
            now,
            self.day_offset,
        );

        let record = match self.active.take() {
            Some(active) if active.question_id() == question_id => active.finish(score, now),
            other => {
                self.active = other;
                SessionRecord::instant(question_id.clone(), score, now)
            }
        };

        Ok(self.commit(applied.entry, streak, record, now))
    }

    /// Score the session in progress, letting `finalize` add its last
    /// messages or diagram first.
    ///
    /// `finalize` runs only once rescheduling has succeeded, so a rejected
    /// transition leaves the session in progress exactly as it was.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no session was started
    /// - `Scheduler` if the stored entry cannot be rescheduled
    pub fn complete_active_session<F>(
        &mut self,
        score: Score,
        finalize: F,
    ) -> Result<ProgressSnapshot, ProgressError>
    where
        F: FnOnce(&mut ActiveSession, DateTime<Utc>),
    {
        let question_id = self
            .active
            .as_ref()
            .map(|s| s.question_id().clone())
            .ok_or(ProgressError::NoActiveSession)?;
        self.ensure_known(&question_id)?;
        let now = self.clock.now();

        let applied = self
            .scheduler
            .apply_review(self.schedule.get(&question_id), score, now)?;
        let streak = next_streak(
            self.history.first().map(|s| s.ended_at),
            self.streak,
            now,
            self.day_offset,
        );

        let mut active = self.active.take().ok_or(ProgressError::NoActiveSession)?;
        finalize(&mut active, now);
        let record = active.finish(score, now);

        Ok(self.commit(applied.entry, streak, record, now))
    }

    fn commit(
        &mut self,
        entry: ScheduleEntry,
        streak: u32,
        record: SessionRecord,
        now: DateTime<Utc>,
    ) -> ProgressSnapshot {
        self.schedule.insert(record.question_id.clone(), entry);
        self.history.insert(0, record);
        self.history.truncate(HISTORY_LIMIT);
        self.streak = streak;
        self.stats = AggregateStats::derive(&self.schedule, self.catalog.len(), streak);
        self.snapshot_at(now)
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn stats(&self) -> AggregateStats {
        self.stats
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn schedule(&self) -> &BTreeMap<QuestionId, ScheduleEntry> {
        &self.schedule
    }

    #[must_use]
    pub fn entry(&self, question_id: &QuestionId) -> Option<&ScheduleEntry> {
        self.schedule.get(question_id)
    }

    /// Completed sessions, most recent first.
    #[must_use]
    pub fn history(&self) -> &[SessionRecord] {
        &self.history
    }

    pub fn sessions_for<'a>(
        &'a self,
        question_id: &'a QuestionId,
    ) -> impl Iterator<Item = &'a SessionRecord> + 'a {
        self.history
            .iter()
            .filter(move |s| &s.question_id == question_id)
    }

    /// Due questions as of the store's clock.
    #[must_use]
    pub fn due_questions(&self) -> Vec<&Question> {
        self.due_questions_at(self.clock.now())
    }

    #[must_use]
    pub fn due_questions_at(&self, now: DateTime<Utc>) -> Vec<&Question> {
        compute_due_questions(&self.catalog, &self.schedule, now)
    }

    /// Scheduled questions ordered by next review, soonest first.
    #[must_use]
    pub fn upcoming(&self, limit: usize) -> Vec<(&QuestionId, &ScheduleEntry)> {
        let mut entries: Vec<_> = self.schedule.iter().collect();
        entries.sort_by_key(|(id, entry)| (entry.next_review, *id));
        entries.truncate(limit);
        entries
    }

    #[must_use]
    pub fn category_breakdown(&self) -> Vec<CategoryStats> {
        CategoryStats::breakdown(&self.catalog, &self.schedule)
    }

    #[must_use]
    pub fn difficulty_breakdown(&self) -> Vec<DifficultyStats> {
        DifficultyStats::breakdown(&self.catalog, &self.schedule)
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(self.clock.now())
    }

    fn snapshot_at(&self, now: DateTime<Utc>) -> ProgressSnapshot {
        ProgressSnapshot {
            schedule: self.schedule.clone(),
            due: self.due_questions_at(now).into_iter().cloned().collect(),
            stats: self.stats,
            streak: self.streak,
            taken_at: now,
        }
    }

    fn ensure_known(&self, question_id: &QuestionId) -> Result<(), ProgressError> {
        if self.catalog.contains(question_id) {
            Ok(())
        } else {
            Err(ProgressError::UnknownQuestion(question_id.clone()))
        }
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Difficulty};
    use crate::time::{fixed_clock, fixed_now};
    use chrono::Duration;

    const EPS: f64 = 1e-9;

    fn qid(id: &str) -> QuestionId {
        QuestionId::new(id).unwrap()
    }

    fn score(value: u8) -> Score {
        Score::new(value).unwrap()
    }

    fn catalog(ids: &[&str]) -> Arc<QuestionCatalog> {
        Arc::new(
            QuestionCatalog::new(
                ids.iter()
                    .map(|id| {
                        Question::new(
                            qid(id),
                            format!("Question {id}"),
                            Category::Api,
                            Difficulty::Medium,
                        )
                    })
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn store(ids: &[&str]) -> ProgressStore {
        ProgressStore::new(catalog(ids)).with_clock(fixed_clock())
    }

    fn advance(store: &mut ProgressStore, delta: Duration) {
        let mut clock = store.clock();
        clock.advance(delta);
        store.set_clock(clock);
    }

    #[test]
    fn first_completion_schedules_and_starts_streak() {
        let mut store = store(&["Q1", "Q2"]);
        let snapshot = store.complete_session(&qid("Q1"), score(80)).unwrap();

        let entry = &snapshot.schedule[&qid("Q1")];
        assert_eq!(entry.repetitions, 1);
        assert_eq!(entry.interval, 1);
        assert!((entry.ease_factor - 2.5).abs() < EPS);
        assert_eq!(entry.next_review, fixed_now() + Duration::days(1));
        assert_eq!(entry.best_score.value(), 80);
        assert_eq!(entry.times_practiced, 1);

        assert_eq!(snapshot.streak, 1);
        assert_eq!(snapshot.stats.total_practiced, 1);
        assert_eq!(snapshot.stats.average_score, 80);
        assert_eq!(snapshot.stats.total_questions, 2);
        // Q1 is now scheduled for tomorrow, Q2 is still new.
        assert_eq!(snapshot.due.len(), 1);
        assert_eq!(snapshot.due[0].id, qid("Q2"));
    }

    #[test]
    fn same_day_failure_resets_but_keeps_best_and_streak() {
        let mut store = store(&["Q1"]);
        store.complete_session(&qid("Q1"), score(80)).unwrap();
        let snapshot = store.complete_session(&qid("Q1"), score(40)).unwrap();

        let entry = &snapshot.schedule[&qid("Q1")];
        assert_eq!(entry.repetitions, 0);
        assert_eq!(entry.interval, 1);
        assert!((entry.ease_factor - 2.18).abs() < EPS);
        assert_eq!(entry.best_score.value(), 80);
        assert_eq!(entry.times_practiced, 2);
        assert_eq!(snapshot.streak, 1);
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn history_is_capped_and_evicts_oldest() {
        let mut store = store(&["Q1"]);
        for i in 0..=HISTORY_LIMIT {
            advance(&mut store, Duration::minutes(1));
            let s = u8::try_from(i % 101).unwrap();
            store.complete_session(&qid("Q1"), score(s)).unwrap();
        }

        let history = store.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        // the first session scored 0, the second 1; only the first is gone
        assert_eq!(history.last().unwrap().score.value(), 1);
        assert_eq!(history.first().unwrap().score.value(), 50);
        assert!(history.windows(2).all(|w| w[0].ended_at >= w[1].ended_at));
    }

    #[test]
    fn streak_follows_calendar_days() {
        let mut store = store(&["Q1"]);
        store.complete_session(&qid("Q1"), score(70)).unwrap();

        advance(&mut store, Duration::days(1));
        assert_eq!(store.complete_session(&qid("Q1"), score(70)).unwrap().streak, 2);

        advance(&mut store, Duration::hours(1));
        assert_eq!(store.complete_session(&qid("Q1"), score(70)).unwrap().streak, 2);

        advance(&mut store, Duration::days(3));
        assert_eq!(store.complete_session(&qid("Q1"), score(70)).unwrap().streak, 1);
        assert_eq!(store.stats().streak, 1);
    }

    #[test]
    fn mastery_counts_entries_with_five_repetitions() {
        let mut persisted = PersistedProgress::default();
        let mut six = ScheduleEntry::new_at(fixed_now());
        six.repetitions = 6;
        let mut three = ScheduleEntry::new_at(fixed_now());
        three.repetitions = 3;
        persisted.schedule.insert(qid("Q1"), six);
        persisted.schedule.insert(qid("Q2"), three);

        let store = ProgressStore::restore(catalog(&["Q1", "Q2"]), persisted).unwrap();
        assert_eq!(store.stats().mastered, 1);
        assert_eq!(store.stats().total_practiced, 2);
    }

    #[test]
    fn repeated_passes_reach_mastery() {
        let mut store = store(&["Q1"]);
        for _ in 0..4 {
            store.complete_session(&qid("Q1"), score(90)).unwrap();
        }
        assert_eq!(store.stats().mastered, 0);
        store.complete_session(&qid("Q1"), score(90)).unwrap();
        assert_eq!(store.stats().mastered, 1);
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut store = store(&["Q1"]);
        let err = store.complete_session(&qid("nope"), score(50)).unwrap_err();
        assert_eq!(err, ProgressError::UnknownQuestion(qid("nope")));
        assert!(store.history().is_empty());
        assert!(store.start_session(&qid("nope")).is_err());
    }

    #[test]
    fn failed_transition_leaves_state_untouched() {
        let mut entry = ScheduleEntry::new_at(fixed_now());
        entry.repetitions = 5;
        entry.interval = u32::MAX;
        entry.ease_factor = 3.0;
        let mut persisted = PersistedProgress::default();
        persisted.schedule.insert(qid("Q1"), entry.clone());
        persisted.streak = 4;

        let mut store = ProgressStore::restore(catalog(&["Q1"]), persisted)
            .unwrap()
            .with_clock(fixed_clock());
        store.start_session(&qid("Q1")).unwrap();

        let err = store.complete_session(&qid("Q1"), score(100)).unwrap_err();
        assert!(matches!(err, ProgressError::Scheduler(SchedulerError::IntervalOverflow { .. })));
        assert_eq!(store.entry(&qid("Q1")), Some(&entry));
        assert!(store.history().is_empty());
        assert_eq!(store.streak(), 4);
        assert!(store.active_session().is_some());
    }

    #[test]
    fn rejected_active_completion_keeps_session_as_it_was() {
        let mut entry = ScheduleEntry::new_at(fixed_now());
        entry.repetitions = 5;
        entry.interval = u32::MAX;
        entry.ease_factor = 3.0;
        let mut persisted = PersistedProgress::default();
        persisted.schedule.insert(qid("Q1"), entry);

        let mut store = ProgressStore::restore(catalog(&["Q1"]), persisted)
            .unwrap()
            .with_clock(fixed_clock());
        store.start_session(&qid("Q1")).unwrap();

        for _ in 0..2 {
            let err = store
                .complete_active_session(score(100), |session, now| {
                    session.push_message(SessionMessage::new(MessageRole::User, "answer", now));
                    session.set_diagram("graph TD; a-->b");
                })
                .unwrap_err();
            assert!(matches!(err, ProgressError::Scheduler(_)));
        }

        let active = store.active_session().unwrap();
        assert!(active.messages().is_empty());
        assert_eq!(active.diagram(), "");
        assert!(store.history().is_empty());
    }

    #[test]
    fn active_completion_applies_finalize() {
        let mut store = store(&["Q1"]);
        let id = store.start_session(&qid("Q1")).unwrap().id();

        let snapshot = store
            .complete_active_session(score(70), |session, now| {
                session.push_message(SessionMessage::new(MessageRole::User, "answer", now));
            })
            .unwrap();

        assert_eq!(snapshot.schedule[&qid("Q1")].repetitions, 1);
        assert!(store.active_session().is_none());
        let record = &store.history()[0];
        assert_eq!(record.id, id);
        assert_eq!(record.messages.len(), 1);

        let err = store.complete_active_session(score(70), |_, _| {}).unwrap_err();
        assert_eq!(err, ProgressError::NoActiveSession);
    }

    #[test]
    fn active_session_becomes_history_record() {
        let mut store = store(&["Q1", "Q2"]);
        let id = store.start_session(&qid("Q1")).unwrap().id();
        store.add_message(MessageRole::User, "shard by user id").unwrap();
        store.set_diagram("graph LR; A-->B").unwrap();
        advance(&mut store, Duration::minutes(20));

        store.complete_session(&qid("Q1"), score(65)).unwrap();

        assert!(store.active_session().is_none());
        let record = &store.history()[0];
        assert_eq!(record.id, id);
        assert_eq!(record.messages.len(), 1);
        assert_eq!(record.diagram.as_deref(), Some("graph LR; A-->B"));
        assert_eq!(record.ended_at - record.started_at, Duration::minutes(20));
    }

    #[test]
    fn completing_other_question_keeps_active_session() {
        let mut store = store(&["Q1", "Q2"]);
        store.start_session(&qid("Q1")).unwrap();
        store.complete_session(&qid("Q2"), score(65)).unwrap();

        assert_eq!(store.active_session().unwrap().question_id(), &qid("Q1"));
        assert_eq!(store.history()[0].question_id, qid("Q2"));
        assert_eq!(store.history()[0].started_at, store.history()[0].ended_at);
    }

    #[test]
    fn messages_require_active_session() {
        let mut store = store(&["Q1"]);
        assert_eq!(
            store.add_message(MessageRole::User, "hi"),
            Err(ProgressError::NoActiveSession)
        );
        assert_eq!(store.set_diagram("x"), Err(ProgressError::NoActiveSession));

        store.start_session(&qid("Q1")).unwrap();
        assert!(store.abandon_session().is_some());
        assert!(store.active_session().is_none());
        assert!(store.history().is_empty());
    }

    #[test]
    fn due_set_tracks_clock() {
        let mut store = store(&["Q1", "Q2"]);
        store.complete_session(&qid("Q1"), score(100)).unwrap();
        assert_eq!(store.due_questions().len(), 1);

        advance(&mut store, Duration::days(1));
        assert_eq!(store.due_questions().len(), 2);
        assert_eq!(store.snapshot().due.len(), 2);
    }

    #[test]
    fn restore_round_trips_and_rederives_stats() {
        let mut store = store(&["Q1", "Q2"]);
        store.complete_session(&qid("Q1"), score(90)).unwrap();
        store.complete_session(&qid("Q2"), score(30)).unwrap();

        let mut persisted = store.to_persisted();
        persisted.stats = AggregateStats::default();

        let restored = ProgressStore::restore(catalog(&["Q1", "Q2"]), persisted).unwrap();
        assert_eq!(restored.stats(), store.stats());
        assert_eq!(restored.history(), store.history());
        assert_eq!(restored.schedule(), store.schedule());
    }

    #[test]
    fn restore_truncates_oversized_history() {
        let one = SessionRecord::instant(qid("Q1"), score(10), fixed_now());
        let persisted = PersistedProgress {
            history: vec![one; HISTORY_LIMIT + 5],
            ..PersistedProgress::default()
        };
        let store = ProgressStore::restore(catalog(&["Q1"]), persisted).unwrap();
        assert_eq!(store.history().len(), HISTORY_LIMIT);
    }

    #[test]
    fn restore_rejects_sub_floor_ease() {
        let mut entry = ScheduleEntry::new_at(fixed_now());
        entry.ease_factor = 1.0;
        let mut persisted = PersistedProgress::default();
        persisted.schedule.insert(qid("Q1"), entry);

        let err = ProgressStore::restore(catalog(&["Q1"]), persisted).unwrap_err();
        assert!(matches!(err, ProgressError::InvalidPersistedState(_)));
    }

    #[test]
    fn upcoming_orders_by_next_review() {
        let mut store = store(&["Q1", "Q2", "Q3"]);
        store.complete_session(&qid("Q1"), score(90)).unwrap();
        store.complete_session(&qid("Q1"), score(90)).unwrap(); // 6 days
        store.complete_session(&qid("Q2"), score(90)).unwrap(); // 1 day

        let upcoming = store.upcoming(5);
        let ids: Vec<&str> = upcoming.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["Q2", "Q1"]);
        assert_eq!(store.upcoming(1).len(), 1);
    }

    #[test]
    fn difficulty_breakdown_tracks_best_scores() {
        let mut store = store(&["Q1", "Q2"]);
        store.complete_session(&qid("Q1"), score(40)).unwrap();
        store.complete_session(&qid("Q1"), score(90)).unwrap();

        let rows = store.difficulty_breakdown();
        let medium = rows.iter().find(|r| r.difficulty == Difficulty::Medium).unwrap();
        assert_eq!((medium.total, medium.practiced), (2, 1));
        assert_eq!(medium.average_best_score, Some(90));
    }

    #[test]
    fn sessions_for_filters_history() {
        let mut store = store(&["Q1", "Q2"]);
        store.complete_session(&qid("Q1"), score(50)).unwrap();
        store.complete_session(&qid("Q2"), score(50)).unwrap();
        store.complete_session(&qid("Q1"), score(60)).unwrap();

        let q1 = qid("Q1");
        assert_eq!(store.sessions_for(&q1).count(), 2);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut store = store(&["Q1", "Q2"]);
        store.complete_session(&qid("Q1"), score(80)).unwrap();
        store.start_session(&qid("Q2")).unwrap();

        store.reset();

        assert!(store.schedule().is_empty());
        assert!(store.history().is_empty());
        assert!(store.active_session().is_none());
        assert_eq!(store.streak(), 0);
        assert_eq!(store.stats().total_questions, 2);
        assert_eq!(store.due_questions().len(), 2);
    }
}
