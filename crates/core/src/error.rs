use thiserror::Error;

use crate::model::{CatalogError, IdError, ScoreError};
use crate::progress::ProgressError;
use crate::scheduler::SchedulerError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
