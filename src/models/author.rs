//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{book::BookShort, join_first_three};

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Rich text (HTML)
    pub biography: Option<String>,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Internal row for the author listing (first book titles aggregated in SQL)
#[derive(Debug, Clone, FromRow)]
pub struct AuthorListRow {
    id: i32,
    first_name: String,
    last_name: String,
    book_titles: Vec<String>,
}

impl From<AuthorListRow> for AuthorListEntry {
    fn from(row: AuthorListRow) -> Self {
        AuthorListEntry {
            display_books: join_first_three(row.book_titles.iter().map(String::as_str)),
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

/// Author as shown in the paginated listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorListEntry {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Up to three book titles, comma separated
    pub display_books: String,
}

/// Author detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<BookShort>,
    pub display_books: String,
}

impl AuthorDetails {
    pub fn new(author: Author, books: Vec<BookShort>) -> Self {
        let display_books = join_first_three(books.iter().map(|b| b.title.as_str()));
        Self {
            author,
            books,
            display_books,
        }
    }
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: String,
    #[validate(length(max = 8000, message = "Biography must be at most 8000 characters"))]
    pub biography: Option<String>,
}

/// Update author request; `biography: null` clears the biography
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 8000, message = "Biography must be at most 8000 characters"))]
    pub biography: Option<Option<String>>,
}
