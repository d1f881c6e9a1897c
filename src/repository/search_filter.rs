//! Dynamic WHERE clause assembly for index searches.
//!
//! Each optional filter becomes a [`Predicate`]. Folding them yields a
//! [`SearchFilter`] holding the clause text and the parameters in placeholder
//! order; values never reach the SQL text.

use crate::models::book_index::{GeoPoint, SearchBooks, TextFilter};

/// Fixed page size of the search endpoint
pub const PAGE_SIZE: i64 = 100;

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Rows within `radius` metres of `origin`
    WithinRadius { origin: GeoPoint, radius: f64 },
    /// Case-insensitive substring of title, author or isbn
    AnyFieldContains(String),
    TitleContains(String),
    AuthorContains(String),
    IsbnEquals(String),
}

/// LIKE pattern matching `term` anywhere, with wildcards escaped. Case is
/// left alone; the query folds both sides with `LOWER()`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Predicate {
    /// Collect the predicates a search request asks for. Geo comes first so
    /// its placeholders are always `$1..$3`.
    pub fn from_request(request: &SearchBooks) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some((origin, radius)) = request.geo() {
            predicates.push(Predicate::WithinRadius { origin, radius });
        }

        match request.text_filter() {
            TextFilter::None => {}
            TextFilter::Fuzzy(term) => predicates.push(Predicate::AnyFieldContains(term)),
            TextFilter::Fields {
                title,
                author,
                isbn,
            } => {
                predicates.extend(title.map(Predicate::TitleContains));
                predicates.extend(author.map(Predicate::AuthorContains));
                predicates.extend(isbn.map(Predicate::IsbnEquals));
            }
        }

        predicates
    }

    /// Clause text using placeholders from `first`, and its parameters
    fn render(&self, first: usize) -> (String, Vec<SqlParam>) {
        match self {
            Predicate::WithinRadius { origin, radius } => (
                format!(
                    "ST_DWithin(coordinates, ST_MakePoint(${}, ${})::geography, ${})",
                    first,
                    first + 1,
                    first + 2
                ),
                vec![
                    SqlParam::Float(origin.longitude),
                    SqlParam::Float(origin.latitude),
                    SqlParam::Float(*radius),
                ],
            ),
            Predicate::AnyFieldContains(term) => (
                format!(
                    "(LOWER(title) LIKE LOWER(${p}) OR LOWER(author) LIKE LOWER(${p}) OR LOWER(isbn) LIKE LOWER(${p}))",
                    p = first
                ),
                vec![SqlParam::Text(contains_pattern(term))],
            ),
            Predicate::TitleContains(term) => (
                format!("LOWER(title) LIKE LOWER(${})", first),
                vec![SqlParam::Text(contains_pattern(term))],
            ),
            Predicate::AuthorContains(term) => (
                format!("LOWER(author) LIKE LOWER(${})", first),
                vec![SqlParam::Text(contains_pattern(term))],
            ),
            Predicate::IsbnEquals(isbn) => (
                format!("isbn = ${}", first),
                vec![SqlParam::Text(isbn.clone())],
            ),
        }
    }
}

/// Folded conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    clauses: Vec<String>,
    params: Vec<SqlParam>,
    /// Placeholders holding the geo origin (longitude, latitude)
    origin: Option<(usize, usize)>,
}

impl SearchFilter {
    pub fn new(predicates: &[Predicate]) -> Self {
        let mut filter = SearchFilter::default();

        for predicate in predicates {
            let first = filter.params.len() + 1;
            let (clause, params) = predicate.render(first);
            if let Predicate::WithinRadius { .. } = predicate {
                filter.origin = Some((first, first + 1));
            }
            filter.clauses.push(clause);
            filter.params.extend(params);
        }

        filter
    }

    pub fn from_request(request: &SearchBooks) -> Self {
        Self::new(&Predicate::from_request(request))
    }

    /// True when the search matches every row
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn is_geo(&self) -> bool {
        self.origin.is_some()
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM books_index{}", self.where_clause())
    }

    /// Page query; LIMIT and OFFSET take the two placeholders after the
    /// filter parameters.
    pub fn page_sql(&self) -> String {
        let limit = self.params.len() + 1;
        let offset = limit + 1;

        // order on the exact distance; only the projection is rounded
        let (projection, order) = match self.origin {
            Some((lon, lat)) => {
                let distance = format!(
                    "ST_Distance(coordinates, ST_MakePoint(${}, ${})::geography)",
                    lon, lat
                );
                (
                    format!("id, ROUND({})::bigint AS distance", distance),
                    format!("{} ASC", distance),
                )
            }
            None => (
                "id, NULL::bigint AS distance".to_string(),
                "created_at DESC".to_string(),
            ),
        };

        format!(
            "SELECT {} FROM books_index{} ORDER BY {} LIMIT ${} OFFSET ${}",
            projection,
            self.where_clause(),
            order,
            limit,
            offset
        )
    }
}

pub fn total_pages(total: i64) -> i64 {
    (total.max(0) + PAGE_SIZE - 1) / PAGE_SIZE
}

pub fn page_offset(page: i64) -> i64 {
    page.saturating_mul(PAGE_SIZE)
}
