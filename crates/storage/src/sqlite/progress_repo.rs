use chrono::Utc;
use prep_core::progress::PersistedProgress;

use super::{
    SqliteRepository,
    mapping::{i64_from_usize, map_entry_row, map_meta_row, map_session_row, ser},
};
use crate::repository::{ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(&self) -> Result<Option<PersistedProgress>, StorageError> {
        let meta = sqlx::query(
            r"
                SELECT streak, total_practiced, total_questions, average_score, mastered
                FROM progress_meta
                WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(meta) = meta else {
            return Ok(None);
        };
        let (streak, stats) = map_meta_row(&meta)?;

        let entry_rows = sqlx::query(
            r"
                SELECT
                    question_id, repetitions, ease_factor, interval_days, next_review_at,
                    times_practiced, best_score, last_practiced_at
                FROM schedule_entries
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut progress = PersistedProgress {
            streak,
            stats,
            ..PersistedProgress::default()
        };
        for row in &entry_rows {
            let (id, entry) = map_entry_row(row)?;
            progress.schedule.insert(id, entry);
        }

        let session_rows = sqlx::query(
            r"
                SELECT id, question_id, started_at, ended_at, score, messages, diagram
                FROM sessions
                ORDER BY position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        progress.history.reserve(session_rows.len());
        for row in &session_rows {
            progress.history.push(map_session_row(row)?);
        }

        Ok(Some(progress))
    }

    async fn save(&self, progress: &PersistedProgress) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM schedule_entries")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (id, entry) in &progress.schedule {
            sqlx::query(
                r"
                    INSERT INTO schedule_entries (
                        question_id, repetitions, ease_factor, interval_days, next_review_at,
                        times_practiced, best_score, last_practiced_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(id.as_str())
            .bind(i64::from(entry.repetitions))
            .bind(entry.ease_factor)
            .bind(i64::from(entry.interval))
            .bind(entry.next_review)
            .bind(i64::from(entry.times_practiced))
            .bind(i64::from(entry.best_score.value()))
            .bind(entry.last_practiced)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        sqlx::query("DELETE FROM sessions")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, session) in progress.history.iter().enumerate() {
            let messages = serde_json::to_string(&session.messages).map_err(ser)?;
            sqlx::query(
                r"
                    INSERT INTO sessions (
                        id, position, question_id, started_at, ended_at, score, messages, diagram
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(session.id.to_string())
            .bind(i64_from_usize("position", position)?)
            .bind(session.question_id.as_str())
            .bind(session.started_at)
            .bind(session.ended_at)
            .bind(i64::from(session.score.value()))
            .bind(messages)
            .bind(session.diagram.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        sqlx::query(
            r"
                INSERT INTO progress_meta (
                    id, streak, total_practiced, total_questions, average_score, mastered, updated_at
                )
                VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    streak = excluded.streak,
                    total_practiced = excluded.total_practiced,
                    total_questions = excluded.total_questions,
                    average_score = excluded.average_score,
                    mastered = excluded.mastered,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(i64::from(progress.streak))
        .bind(i64_from_usize("total_practiced", progress.stats.total_practiced)?)
        .bind(i64_from_usize("total_questions", progress.stats.total_questions)?)
        .bind(i64::from(progress.stats.average_score))
        .bind(i64_from_usize("mastered", progress.stats.mastered)?)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        tracing::debug!(
            entries = progress.schedule.len(),
            sessions = progress.history.len(),
            "saved progress snapshot"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for statement in [
            "DELETE FROM schedule_entries",
            "DELETE FROM sessions",
            "DELETE FROM progress_meta",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
