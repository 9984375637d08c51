use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

// ===== Catalog Models =====

/// Movie or program a quote originates from.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Character a quote is attributed to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Show or role together with the number of quotes referencing it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedWithCount {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub quote_count: i64,
}

/// Quote row joined with its show and role names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetail {
    pub id: i32,
    pub text: String,
    pub show_id: i32,
    pub show_name: String,
    pub role_id: i32,
    pub role_name: String,
    pub contains_adult_language: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_quotes: i64,
    pub total_shows: i64,
    pub total_roles: i64,
    pub adult_language_quotes: i64,
}

// ===== Response Envelopes =====

/// Envelope for single-object responses.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Pagination metadata returned alongside list payloads.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub page: i64,
    pub size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PageMetadata {
    pub fn new(page: i64, size: i64, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + size - 1) / size
        };
        Self {
            page,
            size,
            total_items,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: PageMetadata,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: PageMetadata) -> Self {
        Self { data, page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(PageMetadata::new(1, 50, 0).total_pages, 0);
        assert_eq!(PageMetadata::new(1, 50, 50).total_pages, 1);
        assert_eq!(PageMetadata::new(2, 50, 51).total_pages, 2);
        assert_eq!(PageMetadata::new(1, 10, 95).total_pages, 10);
    }
}
