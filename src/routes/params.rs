//! Query parameter helpers shared by the list endpoints.
//!
//! The structs follow Rocket's `FromForm` conventions and derive `JsonSchema`
//! so the generated documentation lists each parameter and its default.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    1
}

const fn default_page_size() -> i64 {
    50
}

pub const MAX_PAGE_SIZE: i64 = 100;

fn normalize_page(page: i64) -> i64 {
    page.max(1)
}

fn normalize_size(size: i64) -> i64 {
    size.clamp(1, MAX_PAGE_SIZE)
}

/// Pagination and name search for the show and role lists.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
pub struct NamedListParams {
    /// One-based page index (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page (clamped between 1 and 100, default 50).
    #[field(default = 50)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    /// Case-insensitive substring match on the name.
    #[serde(default)]
    pub search: Option<String>,
}

impl Default for NamedListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
            search: None,
        }
    }
}

impl NamedListParams {
    pub fn page(&self) -> i64 {
        normalize_page(self.page)
    }

    pub fn size(&self) -> i64 {
        normalize_size(self.size)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }
}

/// Filters and pagination for the quote list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
pub struct QuoteListParams {
    /// One-based page index (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page (clamped between 1 and 100, default 50).
    #[field(default = 50)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    /// Exact show name.
    #[serde(default)]
    pub show: Option<String>,
    /// Case-insensitive substring match on the quote text.
    #[serde(default)]
    pub search: Option<String>,
    /// Restrict to quotes with (`true`) or without (`false`) adult language.
    #[serde(default)]
    pub adult: Option<bool>,
}

impl Default for QuoteListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
            show: None,
            search: None,
            adult: None,
        }
    }
}

impl QuoteListParams {
    pub fn page(&self) -> i64 {
        normalize_page(self.page)
    }

    pub fn size(&self) -> i64 {
        normalize_size(self.size)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    /// Show filter with surrounding whitespace removed; blank means no filter.
    pub fn show_filter(&self) -> Option<&str> {
        self.show.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let params = QuoteListParams {
            page: 0,
            size: 500,
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.size(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = NamedListParams {
            page: 3,
            size: 0,
            search: None,
        };
        assert_eq!(params.size(), 1);
        assert_eq!(params.offset(), 2);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let params = QuoteListParams {
            show: Some("   ".into()),
            search: Some("  force ".into()),
            ..Default::default()
        };
        assert_eq!(params.show_filter(), None);
        assert_eq!(params.search_term(), Some("force"));
    }

    #[test]
    fn query_string_fills_defaults() {
        let params: QuoteListParams =
            rocket::form::Form::parse("show=Casablanca&adult=true").expect("valid query");
        assert_eq!(params.page(), 1);
        assert_eq!(params.size(), 50);
        assert_eq!(params.show_filter(), Some("Casablanca"));
        assert_eq!(params.adult, Some(true));
        assert_eq!(params.search_term(), None);

        let params: NamedListParams = serde_json::from_str("{}").expect("empty object");
        assert_eq!(params.page, 1);
        assert_eq!(params.size, 50);
        assert_eq!(params.search, None);
    }
}
