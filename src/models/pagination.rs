//! Page windows for catalog listings
//!
//! Pages are 1-indexed. A requested page that is missing or not a number
//! resolves to the first page; anything outside `1..=num_pages` is clamped to
//! the nearest valid page. An empty listing still has one (empty) page.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{
    author::AuthorListEntry, book::BookListEntry, book_instance::BookInstanceDetails,
};

/// Query parameters shared by the searchable listings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Free-text search
    pub query: Option<String>,
    /// Page number (1-based, `last` for the final page)
    pub page: Option<String>,
}

impl ListQuery {
    /// Search text, or `None` when blank
    pub fn search(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Resolved slice of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
}

impl PageWindow {
    pub fn resolve(requested: Option<&str>, total: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = num_pages(total, per_page);

        let number = match requested.map(str::trim) {
            Some("last") => num_pages,
            Some(raw) => raw.parse::<i64>().unwrap_or(1),
            None => 1,
        };

        Self {
            number: number.clamp(1, num_pages),
            num_pages,
            per_page,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

fn num_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    AuthorPage = Page<AuthorListEntry>,
    BookPage = Page<BookListEntry>,
    BookInstancePage = Page<BookInstanceDetails>
)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    /// Total number of matching records
    pub total: i64,
    /// Current page number
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: i64) -> Self {
        Self {
            items,
            total,
            page: window.number,
            per_page: window.per_page,
            num_pages: window.num_pages,
            has_previous: window.number > 1,
            has_next: window.number < window.num_pages,
        }
    }
}
