//! Data models for the book index

pub mod book_index;

// Re-export commonly used types
pub use book_index::{
    GeoPoint, IndexedBook, IngestBook, IngestResponse, SearchBooks, SearchHit, SearchResponse,
};
