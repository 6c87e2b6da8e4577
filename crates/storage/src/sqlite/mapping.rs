use chrono::{DateTime, Utc};
use prep_core::model::{
    AggregateStats, QuestionId, ScheduleEntry, Score, SessionId, SessionMessage, SessionRecord,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn i64_from_usize(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn score_from_i64(field: &'static str, v: i64) -> Result<Score, StorageError> {
    let raw = u8::try_from(v)
        .map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))?;
    Score::new(raw).map_err(ser)
}

pub(crate) fn question_id_from_str(raw: String) -> Result<QuestionId, StorageError> {
    QuestionId::new(raw).map_err(ser)
}

pub(crate) fn map_entry_row(row: &SqliteRow) -> Result<(QuestionId, ScheduleEntry), StorageError> {
    let id = question_id_from_str(row.try_get("question_id").map_err(ser)?)?;
    let entry = ScheduleEntry {
        repetitions: u32_from_i64("repetitions", row.try_get("repetitions").map_err(ser)?)?,
        ease_factor: row.try_get("ease_factor").map_err(ser)?,
        interval: u32_from_i64("interval_days", row.try_get("interval_days").map_err(ser)?)?,
        next_review: row.try_get("next_review_at").map_err(ser)?,
        times_practiced: u32_from_i64(
            "times_practiced",
            row.try_get("times_practiced").map_err(ser)?,
        )?,
        best_score: score_from_i64("best_score", row.try_get("best_score").map_err(ser)?)?,
        last_practiced: row
            .try_get::<Option<DateTime<Utc>>, _>("last_practiced_at")
            .map_err(ser)?,
    };
    Ok((id, entry))
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<SessionRecord, StorageError> {
    let id: SessionId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let messages: Vec<SessionMessage> =
        serde_json::from_str(&row.try_get::<String, _>("messages").map_err(ser)?).map_err(ser)?;

    Ok(SessionRecord {
        id,
        question_id: question_id_from_str(row.try_get("question_id").map_err(ser)?)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        ended_at: row.try_get("ended_at").map_err(ser)?,
        score: score_from_i64("score", row.try_get("score").map_err(ser)?)?,
        messages,
        diagram: row.try_get("diagram").map_err(ser)?,
    })
}

pub(crate) fn map_meta_row(row: &SqliteRow) -> Result<(u32, AggregateStats), StorageError> {
    let streak = u32_from_i64("streak", row.try_get("streak").map_err(ser)?)?;
    let average: i64 = row.try_get("average_score").map_err(ser)?;
    let stats = AggregateStats {
        total_practiced: usize_from_i64(
            "total_practiced",
            row.try_get("total_practiced").map_err(ser)?,
        )?,
        total_questions: usize_from_i64(
            "total_questions",
            row.try_get("total_questions").map_err(ser)?,
        )?,
        average_score: score_from_i64("average_score", average)?.value(),
        mastered: usize_from_i64("mastered", row.try_get("mastered").map_err(ser)?)?,
        streak,
    };
    Ok((streak, stats))
}
