use std::sync::Arc;

use async_trait::async_trait;
use nb_core::config::StorageConfig;
use nb_core::{ArticleStore, Error, Result};
use tracing::info;

pub mod backends;

#[cfg(test)]
mod test_utils;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStore + Sized {
    fn get_error_message() -> &'static str;
    async fn from_config(config: &StorageConfig) -> Result<Self>;
}

/// Builds the store selected by `config.backend`.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ArticleStore>> {
    let storage: Arc<dyn ArticleStore> = match config.backend.as_str() {
        "memory" => Arc::new(connect::<InMemoryStorage>(config).await?),
        #[cfg(feature = "sqlite")]
        "sqlite" => Arc::new(connect::<SQLiteStorage>(config).await?),
        other => {
            return Err(Error::Config(format!("Unknown storage backend: {}", other)));
        }
    };
    info!("🏦 Storage backend initialized (using {})", config.backend);
    Ok(storage)
}

async fn connect<T: StorageBackend>(config: &StorageConfig) -> Result<T> {
    T::from_config(config)
        .await
        .map_err(|e| Error::Storage(format!("{} ({})", e, T::get_error_message())))
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
