//! Business logic services

pub mod book_index;
pub mod count_cache;
pub mod secrets;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    repository::{pool::PoolManager, Repository},
};

use self::{
    count_cache::{Clock, CountCache, SystemClock},
    secrets::{SecretResolver, SecretSource},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub pools: Arc<PoolManager>,
    pub book_index: book_index::BookIndexService,
}

impl Services {
    /// Wire services from configuration, using the wall clock and the
    /// configured secret source
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            config,
            secrets::source_from_config(&config.secrets),
            Arc::new(SystemClock),
        )
    }

    /// Wire services around an explicit secret source and clock
    pub fn with_parts(
        config: &AppConfig,
        secret_source: Arc<dyn SecretSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = SecretResolver::new(secret_source, config.secrets.secret_id.clone());
        let pools = Arc::new(PoolManager::new(resolver, config.database.clone()));
        let repository = Repository::new(pools.clone());
        let count_cache = Arc::new(CountCache::new(
            clock,
            chrono::Duration::seconds(config.search.count_cache_ttl_secs),
        ));

        Self {
            pools,
            book_index: book_index::BookIndexService::new(repository, count_cache),
        }
    }
}
