use async_trait::async_trait;
use prep_core::progress::PersistedProgress;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for one user's persisted progress.
///
/// Writes replace the whole snapshot; there is no partial update.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the stored snapshot, or `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the stored data
    /// cannot be decoded.
    async fn load(&self) -> Result<Option<PersistedProgress>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(&self, progress: &PersistedProgress) -> Result<(), StorageError>;

    /// Remove all stored progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<Option<PersistedProgress>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with a snapshot.
    #[must_use]
    pub fn with_progress(progress: PersistedProgress) -> Self {
        Self {
            progress: Arc::new(Mutex::new(Some(progress))),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make subsequent `save`/`clear` calls fail with `StorageError::Connection`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self) -> Result<Option<PersistedProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save(&self, progress: &PersistedProgress) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(progress.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{QuestionId, ScheduleEntry};
    use prep_core::time::fixed_now;

    fn sample() -> PersistedProgress {
        let mut progress = PersistedProgress::default();
        progress
            .schedule
            .insert(QuestionId::new("1").unwrap(), ScheduleEntry::new_at(fixed_now()));
        progress.streak = 3;
        progress
    }

    #[tokio::test]
    async fn empty_repository_loads_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_returns_snapshot() {
        let repo = InMemoryRepository::new();
        repo.save(&sample()).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample());

        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_writes_keep_previous_snapshot() {
        let repo = InMemoryRepository::with_progress(sample());
        repo.set_fail_writes(true);

        let err = repo.save(&PersistedProgress::default()).await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert_eq!(repo.load().await.unwrap().unwrap().streak, 3);
    }

    #[tokio::test]
    async fn storage_in_memory_is_usable_through_trait_object() {
        let storage = Storage::in_memory();
        storage.progress.save(&sample()).await.unwrap();
        assert!(storage.progress.load().await.unwrap().is_some());
    }
}
