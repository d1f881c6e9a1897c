//! Book index endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::book_index::{IngestBook, IngestResponse, SearchBooks, SearchResponse},
};

use super::JsonBody;

/// Add a book to the search index
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = IngestBook,
    responses(
        (status = 201, description = "Book indexed", body = IngestResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already indexed", body = crate::error::ErrorResponse),
        (status = 500, description = "Store failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn ingest_book(
    State(state): State<crate::AppState>,
    JsonBody(request): JsonBody<IngestBook>,
) -> AppResult<(StatusCode, Json<IngestResponse>)> {
    let indexed = state
        .services
        .book_index
        .ingest(&request)
        .await
        .map_err(|e| {
            e.or_failed(
                "Error adding book to database",
                state.config.expose_error_details(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "Book added successfully".to_string(),
            data: indexed,
        }),
    ))
}

/// Search the index, optionally by text and distance
#[utoipa::path(
    post,
    path = "/books/search",
    tag = "books",
    request_body = SearchBooks,
    responses(
        (status = 200, description = "One page of matching book ids", body = SearchResponse),
        (status = 500, description = "Store failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    JsonBody(request): JsonBody<SearchBooks>,
) -> AppResult<Json<SearchResponse>> {
    let response = state
        .services
        .book_index
        .search(&request)
        .await
        .map_err(|e| e.or_failed("Failed to fetch books", true))?;

    Ok(Json(response))
}
