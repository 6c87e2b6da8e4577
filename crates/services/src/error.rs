//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::ProgressError;
use prep_core::model::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `PracticeService` and the catalog loader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    /// Reading stored progress failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The transition was applied in memory but could not be written back.
    #[error("progress was updated but could not be saved: {0}")]
    Persist(#[source] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid catalog data: {0}")]
    CatalogData(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
