use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher, ParallelFetcher};
use crate::store::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub parallel_fetcher: ParallelFetcher,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let store = SqliteStore::new(config.database_path()?)?;
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, SqliteStore::in_memory()?)
    }

    fn with_store(config: Config, store: SqliteStore) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.feeds)?);
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher, config.feeds.workers);

        Ok(Self {
            config,
            store: Arc::new(store),
            parallel_fetcher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WatermarkStore;

    #[test]
    fn test_context_opens_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database = Some(dir.path().join("content.db"));

        let ctx = AppContext::new(config).unwrap();
        assert!(ctx.store.all().unwrap().is_empty());
        assert!(dir.path().join("content.db").exists());
    }
}
