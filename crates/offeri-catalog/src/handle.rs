use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{CatalogError, Result};
use crate::storage::CatalogStorage;

/// Shared, initialised storage. Every query holds the lock for its whole
/// duration, so read-check-write sequences are atomic.
#[derive(Clone)]
pub struct StorageHandle {
    inner: Arc<Mutex<CatalogStorage>>,
}

impl StorageHandle {
    pub fn new(storage: CatalogStorage) -> Result<Self> {
        storage.init()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(storage)),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Task(e.to_string()))?;
        }
        info!("Opening program catalog at {}", path.display());
        Self::new(CatalogStorage::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(CatalogStorage::open_in_memory()?)
    }

    /// Runs `f` on the blocking pool with the storage locked.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CatalogStorage) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let storage = inner.lock();
            f(&storage)
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))?
        .map_err(CatalogError::from)
    }

    /// Synchronous access for CLI commands and seeding.
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CatalogStorage) -> rusqlite::Result<T>,
    {
        let storage = self.inner.lock();
        f(&storage).map_err(CatalogError::from)
    }
}
