//! Book index service: ingestion and search

use std::{future::Future, sync::Arc};

use crate::{
    error::AppResult,
    models::book_index::{IndexedBook, IngestBook, SearchBooks, SearchResponse},
    repository::{
        search_filter::{total_pages, SearchFilter},
        Repository,
    },
};

use super::count_cache::CountCache;

#[derive(Clone)]
pub struct BookIndexService {
    repository: Repository,
    count_cache: Arc<CountCache>,
}

impl BookIndexService {
    pub fn new(repository: Repository, count_cache: Arc<CountCache>) -> Self {
        Self {
            repository,
            count_cache,
        }
    }

    /// Validate and insert one book into the index
    pub async fn ingest(&self, request: &IngestBook) -> AppResult<IndexedBook> {
        let book = request.validated()?;

        let mut conn = self.repository.pools.acquire().await?;
        let indexed = self.repository.books_index.insert(&mut conn, &book).await?;

        tracing::info!(
            "Indexed book id={} located={}",
            indexed.id,
            indexed.longitude.is_some()
        );
        Ok(indexed)
    }

    /// Run one search page. Count and page fetch share a connection but not
    /// a snapshot.
    pub async fn search(&self, request: &SearchBooks) -> AppResult<SearchResponse> {
        let page = request.page_number();
        let filter = SearchFilter::from_request(request);
        tracing::debug!(
            "Searching page={} filtered={} geo={}",
            page,
            !filter.is_empty(),
            filter.is_geo()
        );

        let mut conn = self.repository.pools.acquire().await?;

        let total = total_rows(
            &filter,
            &self.count_cache,
            self.repository.books_index.count(&mut conn, &filter),
        )
        .await?;

        let results = self
            .repository
            .books_index
            .fetch_page(&mut conn, &filter, page)
            .await?;

        Ok(SearchResponse {
            message: "Success".to_string(),
            page,
            total_pages: total_pages(total),
            count: results.len(),
            results,
        })
    }

    /// Readiness check: the pool resolves and answers a trivial query
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.repository.pools.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

/// Total matching rows. Unfiltered searches are served from the cache while
/// it is fresh; filtered searches always run `count` and never touch the
/// cache.
async fn total_rows<F>(filter: &SearchFilter, cache: &CountCache, count: F) -> AppResult<i64>
where
    F: Future<Output = AppResult<i64>>,
{
    if !filter.is_empty() {
        return count.await;
    }
    if let Some(total) = cache.get() {
        return Ok(total);
    }
    let total = count.await?;
    cache.store(total);
    Ok(total)
}
