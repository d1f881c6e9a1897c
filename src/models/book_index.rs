//! Book index models: the searchable projection of a book and the
//! request/response shapes of the ingestion and search endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, AppResult};

/// A (longitude, latitude) pair in degrees, WGS 84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// Row stored in `books_index`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IndexedBook {
    /// Identifier assigned by the primary book store
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

/// Ingestion request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct IngestBook {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
}

/// Validated ingestion input, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewIndexedBook {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

/// Ingestion success body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub message: String,
    pub data: IndexedBook,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_message(errors: &ValidationErrors, field: &str) -> Option<String> {
    errors
        .field_errors()
        .get(field)?
        .first()?
        .message
        .as_ref()
        .map(|m| m.to_string())
}

impl IngestBook {
    /// Check the ingestion rules in order; the first failure wins.
    pub fn validated(&self) -> AppResult<NewIndexedBook> {
        // ids are stored exactly as the primary store issued them
        let id = self.id.clone().filter(|id| !id.trim().is_empty());
        let (Some(id), Some(title), Some(author)) = (
            id,
            non_blank(&self.title),
            non_blank(&self.author),
        ) else {
            return Err(AppError::Validation(
                "Missing required fields: id, title, and author are required".to_string(),
            ));
        };

        if self.longitude.is_some() != self.latitude.is_some() {
            return Err(AppError::Validation(
                "Both longitude and latitude must be provided together".to_string(),
            ));
        }

        if let Err(errors) = self.validate() {
            let message = first_message(&errors, "longitude")
                .or_else(|| first_message(&errors, "latitude"))
                .unwrap_or_else(|| errors.to_string());
            return Err(AppError::Validation(message));
        }

        let coordinates = match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(GeoPoint {
                longitude,
                latitude,
            }),
            _ => None,
        };

        Ok(NewIndexedBook {
            id,
            title,
            author,
            isbn: non_blank(&self.isbn),
            coordinates,
        })
    }
}

/// Search request body.
///
/// `query` (or a lone `title`) triggers fuzzy search across title, author and
/// isbn. Distinct `title`/`author`/`isbn` values are matched field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SearchBooks {
    /// 0-based page; anything non-numeric or negative reads as 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub page: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Search radius in metres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// How the text fields of a search narrow the result set
#[derive(Debug, Clone, PartialEq)]
pub enum TextFilter {
    None,
    /// One term matched against title OR author OR isbn
    Fuzzy(String),
    /// Legacy per-field matching, ANDed
    Fields {
        title: Option<String>,
        author: Option<String>,
        isbn: Option<String>,
    },
}

impl SearchBooks {
    pub fn page_number(&self) -> i64 {
        self.page.as_ref().map(normalize_page).unwrap_or(0)
    }

    /// Origin and radius, only when all three are supplied
    pub fn geo(&self) -> Option<(GeoPoint, f64)> {
        match (self.longitude, self.latitude, self.radius) {
            (Some(longitude), Some(latitude), Some(radius)) => Some((
                GeoPoint {
                    longitude,
                    latitude,
                },
                radius,
            )),
            _ => None,
        }
    }

    pub fn text_filter(&self) -> TextFilter {
        if let Some(term) = non_blank(&self.query) {
            return TextFilter::Fuzzy(term);
        }

        let title = non_blank(&self.title);
        let author = non_blank(&self.author);
        let isbn = non_blank(&self.isbn);

        match (title, author, isbn) {
            (None, None, None) => TextFilter::None,
            (Some(title), author, isbn)
                if author.as_ref().map_or(true, |a| *a == title)
                    && isbn.as_ref().map_or(true, |i| *i == title) =>
            {
                TextFilter::Fuzzy(title)
            }
            (title, author, isbn) => TextFilter::Fields {
                title,
                author,
                isbn,
            },
        }
    }
}

/// Read a page number the way a lenient integer parse would: numbers are
/// truncated, strings are read up to the first non-digit.
fn normalize_page(value: &Value) -> i64 {
    let page = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    };
    page.filter(|p| *p >= 0).unwrap_or(0)
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    // only overflow can fail here; saturate like a float-backed parse would
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// One search hit; `distance` is present only for geo-ranked queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SearchHit {
    pub id: String,
    /// Metres from the search origin, rounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
}

/// Search success body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub message: String,
    pub page: i64,
    pub total_pages: i64,
    /// Number of results on this page
    pub count: usize,
    pub results: Vec<SearchHit>,
}
