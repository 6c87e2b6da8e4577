#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progress;
pub mod scheduler;
pub mod time;

pub use error::Error;
pub use progress::{ProgressError, ProgressSnapshot, ProgressStore};
pub use scheduler::{Scheduler, SchedulerError};
pub use time::Clock;
