use std::sync::Arc;

use chrono::FixedOffset;

use prep_core::model::{
    MessageRole, QuestionCatalog, QuestionId, Score, SessionId, SessionMessage,
};
use prep_core::{Clock, ProgressError, ProgressSnapshot, ProgressStore};
use storage::repository::{ProgressRepository, Storage};

use crate::error::ServiceError;
use crate::feedback::{Answer, Feedback, FeedbackGenerator, KeywordFeedback};

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// Outcome of submitting an answer for the session in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub question_id: QuestionId,
    pub feedback: Feedback,
    pub follow_ups: Vec<String>,
    pub snapshot: ProgressSnapshot,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Host for one user's `ProgressStore`.
///
/// Loads stored progress on construction and writes it back after every
/// scoring transition. Session bookkeeping (`start_session`, `add_message`,
/// `set_diagram`) stays in memory until the session is completed.
pub struct PracticeService {
    store: ProgressStore,
    repository: Arc<dyn ProgressRepository>,
    feedback: Arc<dyn FeedbackGenerator>,
    dirty: bool,
}

impl PracticeService {
    /// Load progress from `repository`, starting empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// - `Storage` if the repository cannot be read
    /// - `Progress` if the stored progress is inconsistent
    pub async fn load(
        catalog: Arc<QuestionCatalog>,
        repository: Arc<dyn ProgressRepository>,
        clock: Clock,
    ) -> Result<Self, ServiceError> {
        let store = match repository.load().await? {
            Some(progress) => {
                tracing::debug!(
                    entries = progress.schedule.len(),
                    sessions = progress.history.len(),
                    "restoring stored progress"
                );
                ProgressStore::restore(catalog, progress)?
            }
            None => {
                tracing::debug!("no stored progress, starting empty");
                ProgressStore::new(catalog)
            }
        };

        Ok(Self {
            store: store.with_clock(clock),
            repository,
            feedback: Arc::new(KeywordFeedback::new()),
            dirty: false,
        })
    }

    /// Open (and migrate) a `SQLite` database, then load from it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Sqlite` if the database cannot be opened, or any
    /// error from [`PracticeService::load`].
    pub async fn open_sqlite(
        db_url: &str,
        catalog: Arc<QuestionCatalog>,
        clock: Clock,
    ) -> Result<Self, ServiceError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::load(catalog, storage.progress, clock).await
    }

    /// Replace the feedback generator used by [`PracticeService::submit_answer`].
    #[must_use]
    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackGenerator>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Offset used to decide calendar days for the streak.
    #[must_use]
    pub fn with_day_offset(mut self, offset: FixedOffset) -> Self {
        self.store = self.store.with_day_offset(offset);
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.store.set_clock(clock);
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    #[must_use]
    pub fn catalog(&self) -> &QuestionCatalog {
        self.store.catalog()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.store.snapshot()
    }

    /// Whether the last write-back failed and in-memory progress is ahead of storage.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    //
    // ─── SESSION ───────────────────────────────────────────────────────────────
    //

    /// Begin a session, replacing any session in progress.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Progress` if the question is not in the catalog.
    pub fn start_session(&mut self, question_id: &QuestionId) -> Result<SessionId, ServiceError> {
        let id = self.store.start_session(question_id)?.id();
        tracing::debug!(%question_id, session_id = %id, "started session");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Progress` if no session is in progress.
    pub fn add_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<(), ServiceError> {
        Ok(self.store.add_message(role, content)?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Progress` if no session is in progress.
    pub fn set_diagram(&mut self, markup: impl Into<String>) -> Result<(), ServiceError> {
        Ok(self.store.set_diagram(markup)?)
    }

    pub fn abandon_session(&mut self) -> bool {
        self.store.abandon_session().is_some()
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Score a session and write the new progress back.
    ///
    /// # Errors
    ///
    /// - `Progress` if the store rejects the transition (nothing changes)
    /// - `Persist` if the transition applied but could not be saved
    pub async fn complete_session(
        &mut self,
        question_id: &QuestionId,
        score: Score,
    ) -> Result<ProgressSnapshot, ServiceError> {
        let snapshot = self.store.complete_session(question_id, score)?;
        self.after_transition(question_id, score, &snapshot).await?;
        Ok(snapshot)
    }

    async fn after_transition(
        &mut self,
        question_id: &QuestionId,
        score: Score,
        snapshot: &ProgressSnapshot,
    ) -> Result<(), ServiceError> {
        if let Some(entry) = snapshot.schedule.get(question_id) {
            tracing::info!(
                %question_id,
                score = score.value(),
                interval = entry.interval,
                repetitions = entry.repetitions,
                streak = snapshot.streak,
                "completed session"
            );
        }

        self.persist().await
    }

    /// Evaluate `answer` for the session in progress and complete it with the
    /// resulting score.
    ///
    /// The answer text is recorded as a user message, the diagram (if any)
    /// replaces the session's diagram, and the follow-up prompts are recorded
    /// as an assistant message. None of this touches the session in progress
    /// if the store rejects the transition.
    ///
    /// # Errors
    ///
    /// - `Progress(NoActiveSession)` if no session was started
    /// - `Progress` if the store rejects the transition
    /// - `Persist` if the transition applied but could not be saved
    pub async fn submit_answer(&mut self, answer: Answer) -> Result<Submission, ServiceError> {
        let question_id = self
            .store
            .active_session()
            .map(|s| s.question_id().clone())
            .ok_or(ProgressError::NoActiveSession)?;
        let question = self
            .store
            .catalog()
            .get(&question_id)
            .cloned()
            .ok_or_else(|| ProgressError::UnknownQuestion(question_id.clone()))?;

        let feedback = self.feedback.evaluate(&question, &answer);
        let follow_ups = self.feedback.follow_ups(&question, &answer);

        let Answer { text, diagram } = answer;
        let prompts = (!follow_ups.is_empty()).then(|| follow_ups.join("\n"));
        let snapshot = self
            .store
            .complete_active_session(feedback.score, |session, now| {
                session.push_message(SessionMessage::new(MessageRole::User, text, now));
                if let Some(diagram) = diagram {
                    session.set_diagram(diagram);
                }
                if let Some(prompts) = prompts {
                    session.push_message(SessionMessage::new(MessageRole::Assistant, prompts, now));
                }
            })?;
        self.after_transition(&question_id, feedback.score, &snapshot).await?;
        Ok(Submission {
            question_id,
            feedback,
            follow_ups,
            snapshot,
        })
    }

    /// Retry a write-back that failed earlier. No-op when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persist` if the write fails again.
    pub async fn flush(&mut self) -> Result<(), ServiceError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist().await
    }

    /// Forget all progress, in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persist` if the stored progress cannot be cleared;
    /// in-memory progress is left untouched in that case.
    pub async fn reset(&mut self) -> Result<(), ServiceError> {
        self.repository.clear().await.map_err(|err| {
            tracing::warn!(error = %err, "failed to clear stored progress");
            ServiceError::Persist(err)
        })?;

        self.store.reset();
        self.dirty = false;
        tracing::info!("progress reset");
        Ok(())
    }

    async fn persist(&mut self) -> Result<(), ServiceError> {
        let progress = self.store.to_persisted();
        match self.repository.save(&progress).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                tracing::warn!(error = %err, "failed to save progress");
                Err(ServiceError::Persist(err))
            }
        }
    }
}
