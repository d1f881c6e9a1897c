//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Index API",
        version = "0.1.0",
        description = "Geo-aware book index and search"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::ingest_book,
        books::search_books,
    ),
    components(
        schemas(
            crate::models::book_index::GeoPoint,
            crate::models::book_index::IndexedBook,
            crate::models::book_index::IngestBook,
            crate::models::book_index::IngestResponse,
            crate::models::book_index::SearchBooks,
            crate::models::book_index::SearchHit,
            crate::models::book_index::SearchResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book index ingestion and search")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
