//! HTTP client for the book index endpoints.
//!
//! Used by the primary book flow after a book has been created in the
//! primary store. Index writes are best effort: [`BookIndexClient::index_created_book`]
//! never fails, it downgrades any indexing error to a warning the caller can
//! show alongside its own success.

use reqwest::{Client, Response};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::book_index::{IndexedBook, IngestBook, IngestResponse, SearchBooks, SearchResponse},
};

/// Result of the best-effort index write
#[derive(Debug, Clone)]
pub enum IndexOutcome {
    Indexed(IndexedBook),
    Warning(String),
}

impl IndexOutcome {
    pub fn warning(&self) -> Option<&str> {
        match self {
            IndexOutcome::Indexed(_) => None,
            IndexOutcome::Warning(msg) => Some(msg),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct BookIndexClient {
    http: Client,
    base_url: String,
}

impl BookIndexClient {
    /// `base_url` is the API root, e.g. `https://host/api/v1`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Add a book to the index
    pub async fn add_book(&self, token: &str, book: &IngestBook) -> AppResult<IndexedBook> {
        let response = self
            .http
            .post(format!("{}/books", self.base_url))
            .bearer_auth(token)
            .json(book)
            .send()
            .await
            .map_err(|e| AppError::IndexRequest(e.to_string()))?;

        let body: IngestResponse = Self::decode(response).await?;
        Ok(body.data)
    }

    /// Fetch one page of search results
    pub async fn search(&self, token: &str, query: &SearchBooks) -> AppResult<SearchResponse> {
        let response = self
            .http
            .post(format!("{}/books/search", self.base_url))
            .bearer_auth(token)
            .json(query)
            .send()
            .await
            .map_err(|e| AppError::IndexRequest(e.to_string()))?;

        Self::decode(response).await
    }

    /// Index a book that already exists in the primary store. The primary
    /// record stays the source of truth, so failures only produce a warning.
    pub async fn index_created_book(&self, token: &str, book: &IngestBook) -> IndexOutcome {
        match self.add_book(token, book).await {
            Ok(indexed) => IndexOutcome::Indexed(indexed),
            Err(e) => {
                let id = book.id.as_deref().unwrap_or_default();
                tracing::warn!("Book {} saved but not indexed: {}", id, e);
                IndexOutcome::Warning(format!(
                    "Book was saved but could not be added to search: {}",
                    e
                ))
            }
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Err(AppError::IndexRequest(message));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::IndexRequest(format!("Malformed index response: {}", e)))
    }
}
