use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{QuestionId, Score, SessionId};

/// Who authored a message inside a practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One entry of the session transcript. Opaque to scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: MessageRole,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl SessionMessage {
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            sent_at,
        }
    }
}

/// A session that has been started but not yet scored.
///
/// Not part of history until it is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    id: SessionId,
    question_id: QuestionId,
    started_at: DateTime<Utc>,
    messages: Vec<SessionMessage>,
    diagram: String,
}

impl ActiveSession {
    #[must_use]
    pub fn new(question_id: QuestionId, started_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            question_id,
            started_at,
            messages: Vec::new(),
            diagram: String::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn messages(&self) -> &[SessionMessage] {
        &self.messages
    }

    #[must_use]
    pub fn diagram(&self) -> &str {
        &self.diagram
    }

    pub fn push_message(&mut self, message: SessionMessage) {
        self.messages.push(message);
    }

    pub fn set_diagram(&mut self, markup: impl Into<String>) {
        self.diagram = markup.into();
    }

    /// Freeze the session into an immutable history record.
    ///
    /// `ended_at` earlier than the start time is pulled up to the start.
    #[must_use]
    pub fn finish(self, score: Score, ended_at: DateTime<Utc>) -> SessionRecord {
        let diagram = if self.diagram.trim().is_empty() {
            None
        } else {
            Some(self.diagram)
        };
        SessionRecord {
            id: self.id,
            question_id: self.question_id,
            started_at: self.started_at,
            ended_at: ended_at.max(self.started_at),
            score,
            messages: self.messages,
            diagram,
        }
    }
}

/// A completed, scored session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub question_id: QuestionId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub score: Score,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    #[serde(default)]
    pub diagram: Option<String>,
}

impl SessionRecord {
    /// A session scored without any recorded interaction.
    #[must_use]
    pub fn instant(question_id: QuestionId, score: Score, at: DateTime<Utc>) -> Self {
        ActiveSession::new(question_id, at).finish(score, at)
    }
}
