//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod pagination;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use book_instance::{BookInstance, BookStatus};
pub use genre::Genre;
pub use pagination::{ListQuery, Page, PageWindow};
pub use review::Review;
pub use user::{User, UserClaims};

/// Number of names shown in compact list columns
pub const DISPLAY_LIMIT: usize = 3;

/// Comma-joined preview of at most [`DISPLAY_LIMIT`] names
pub fn join_first_three<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .take(DISPLAY_LIMIT)
        .collect::<Vec<_>>()
        .join(", ")
}
