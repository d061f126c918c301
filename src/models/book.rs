//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    author::Author, book_instance::BookInstanceDetails, genre::Genre, join_first_three,
    review::ReviewDetails,
};

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    /// Rich text (HTML)
    pub summary: String,
    pub author_id: i32,
    /// Cover image location
    pub cover: Option<String>,
}

/// Minimal book reference used inside other resources
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
}

/// Internal row for book listings (genre names aggregated in SQL, id order)
#[derive(Debug, Clone, FromRow)]
pub struct BookListRow {
    id: i32,
    title: String,
    author_id: i32,
    author_first_name: String,
    author_last_name: String,
    cover: Option<String>,
    genre_names: Vec<String>,
}

impl From<BookListRow> for BookListEntry {
    fn from(row: BookListRow) -> Self {
        BookListEntry {
            display_genre: join_first_three(row.genre_names.iter().map(String::as_str)),
            author_name: format!("{} {}", row.author_first_name, row.author_last_name),
            id: row.id,
            title: row.title,
            author_id: row.author_id,
            cover: row.cover,
        }
    }
}

/// Book as shown in listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookListEntry {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub author_name: String,
    pub cover: Option<String>,
    /// Up to three genre names, comma separated
    pub display_genre: String,
}

/// Book detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Author,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub instances: Vec<BookInstanceDetails>,
    pub reviews: Vec<ReviewDetails>,
}

impl BookDetails {
    pub fn new(
        book: Book,
        author: Author,
        genres: Vec<Genre>,
        instances: Vec<BookInstanceDetails>,
        reviews: Vec<ReviewDetails>,
    ) -> Self {
        Self {
            display_genre: display_genre(&genres),
            book,
            author,
            genres,
            instances,
            reviews,
        }
    }
}

/// Up to three genre names, comma separated
pub fn display_genre(genres: &[Genre]) -> String {
    join_first_three(genres.iter().map(|g| g.name.as_str()))
}

/// Admin filter on the book listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookFilter {
    pub query: Option<String>,
    pub genre_id: Option<i32>,
    pub page: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 250, message = "Title must be between 1 and 250 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 4000, message = "Summary must be between 1 and 4000 characters"))]
    pub summary: String,
    pub author_id: i32,
    #[validate(length(max = 500, message = "Cover path is too long"))]
    pub cover: Option<String>,
    #[validate(length(min = 1, message = "Choose genre(s) for this book"))]
    pub genre_ids: Vec<i32>,
}

/// Update book request; `genre_ids` replaces the whole genre set when present
/// and `cover: null` removes the cover
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 250, message = "Title must be between 1 and 250 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 4000, message = "Summary must be between 1 and 4000 characters"))]
    pub summary: Option<String>,
    pub author_id: Option<i32>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 500, message = "Cover path is too long"))]
    pub cover: Option<Option<String>>,
    #[validate(length(min = 1, message = "Choose genre(s) for this book"))]
    pub genre_ids: Option<Vec<i32>>,
}
