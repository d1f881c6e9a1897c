//! Repository layer for database operations

pub mod books_index;
pub mod pool;
pub mod search_filter;

use std::sync::Arc;

/// Main repository struct holding the lazily created connection pool
#[derive(Clone)]
pub struct Repository {
    pub pools: Arc<pool::PoolManager>,
    pub books_index: books_index::BooksIndexRepository,
}

impl Repository {
    /// Create a new repository over the given pool manager
    pub fn new(pools: Arc<pool::PoolManager>) -> Self {
        Self {
            pools,
            books_index: books_index::BooksIndexRepository::new(),
        }
    }
}
