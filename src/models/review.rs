//! Reader reviews attached to a book

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub book_id: i32,
    pub reviewer_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Review with the reviewer's name, as listed on the book page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReviewDetails {
    pub id: i32,
    pub reviewer_id: i32,
    pub reviewer_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Review form submitted on the book detail page
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewForm {
    #[validate(length(min = 1, max = 2000, message = "Review must be between 1 and 2000 characters"))]
    pub content: String,
}

impl ReviewForm {
    /// Surrounding whitespace does not count towards the content
    pub fn normalized(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
        }
    }
}

/// Response after a review is stored
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewPosted {
    /// Notice to show the reader
    pub message: String,
    pub review: Review,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_review_is_invalid() {
        let form = ReviewForm {
            content: "   \n ".to_string(),
        }
        .normalized();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_review_length() {
        let ok = ReviewForm {
            content: "  Loved it  ".to_string(),
        }
        .normalized();
        assert_eq!(ok.content, "Loved it");
        assert!(ok.validate().is_ok());

        let too_long = ReviewForm {
            content: "x".repeat(2001),
        };
        assert!(too_long.validate().is_err());
    }
}
