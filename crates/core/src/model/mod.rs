mod ids;
mod question;
mod schedule;
mod session;
mod stats;

pub use ids::{IdError, QuestionId, SessionId};
pub use question::{Category, CatalogError, Difficulty, ParseLabelError, Question, QuestionCatalog};
pub use schedule::{Quality, ScheduleEntry, Score, ScoreError};
pub use session::{ActiveSession, MessageRole, SessionMessage, SessionRecord};
pub use stats::{AggregateStats, CategoryStats, DifficultyStats};
