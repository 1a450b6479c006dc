use crate::config::{StorageBackend, StorageConfig};
use klozbuy_core::storage::{InMemoryStorage, Storage};
use std::sync::Arc;
use tracing::info;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    pub fn store(&self) -> &dyn Storage {
        self.storage.as_ref()
    }
}

/// Open the configured storage backend, running migrations for libSQL.
pub async fn open_storage(config: &StorageConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        StorageBackend::Libsql => open_database(config).await,
    }
}

#[cfg(feature = "db")]
async fn open_database(config: &StorageConfig) -> anyhow::Result<Arc<dyn Storage>> {
    use klozbuy_core::storage::DatabaseStorage;

    let url = config
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("storage.url is required for the libsql backend"))?;
    info!("Initializing database storage...");
    let storage = DatabaseStorage::connect(url, config.auth_token.as_deref()).await?;
    info!("Database storage initialized successfully");
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "db"))]
async fn open_database(_config: &StorageConfig) -> anyhow::Result<Arc<dyn Storage>> {
    anyhow::bail!("the libsql backend needs a build with the `db` feature")
}
