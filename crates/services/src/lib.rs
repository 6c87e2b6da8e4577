#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod feedback;
pub mod practice_service;

pub use prep_core::Clock;

pub use catalog::{builtin_catalog, catalog_from_json};
pub use error::ServiceError;
pub use feedback::{Answer, Feedback, FeedbackGenerator, KeywordFeedback, TradeOff};
pub use practice_service::{PracticeService, Submission};
