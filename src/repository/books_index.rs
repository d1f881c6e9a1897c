//! Book index repository for database operations

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::book_index::{IndexedBook, NewIndexedBook, SearchHit},
};

use super::search_filter::{page_offset, SearchFilter, SqlParam, PAGE_SIZE};

#[derive(Clone, Default)]
pub struct BooksIndexRepository;

impl BooksIndexRepository {
    pub fn new() -> Self {
        Self
    }

    /// Insert one index row. The point is built longitude first; with no
    /// coordinates `ST_MakePoint` yields NULL and so does the column.
    pub async fn insert(&self, conn: &mut PgConnection, book: &NewIndexedBook) -> AppResult<IndexedBook> {
        sqlx::query_as::<_, IndexedBook>(
            r#"
            INSERT INTO books_index (id, title, author, isbn, coordinates)
            VALUES ($1, $2, $3, $4, ST_SetSRID(ST_MakePoint($5::float8, $6::float8), 4326)::geography)
            RETURNING id, title, author, isbn, created_at,
                      ST_X(coordinates::geometry) AS longitude,
                      ST_Y(coordinates::geometry) AS latitude
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.coordinates.map(|c| c.longitude))
        .bind(book.coordinates.map(|c| c.latitude))
        .fetch_one(conn)
        .await
        .map_err(AppError::from_insert)
    }

    /// Number of rows matching the filter
    pub async fn count(&self, conn: &mut PgConnection, filter: &SearchFilter) -> AppResult<i64> {
        let sql = filter.count_sql();
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in filter.params() {
            query = match param {
                SqlParam::Text(value) => query.bind(value),
                SqlParam::Float(value) => query.bind(value),
            };
        }

        Ok(query.fetch_one(conn).await?)
    }

    /// One page of matching ids, nearest first for geo searches and newest
    /// first otherwise
    pub async fn fetch_page(
        &self,
        conn: &mut PgConnection,
        filter: &SearchFilter,
        page: i64,
    ) -> AppResult<Vec<SearchHit>> {
        let sql = filter.page_sql();
        let mut query = sqlx::query_as::<_, SearchHit>(&sql);
        for param in filter.params() {
            query = match param {
                SqlParam::Text(value) => query.bind(value),
                SqlParam::Float(value) => query.bind(value),
            };
        }

        let rows = query
            .bind(PAGE_SIZE)
            .bind(page_offset(page))
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }
}
