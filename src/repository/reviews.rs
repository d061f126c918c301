//! Reviews repository

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::review::{Review, ReviewDetails},
};

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Reviews of a book, newest first
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<ReviewDetails>> {
        let reviews = sqlx::query_as::<_, ReviewDetails>(
            r#"
            SELECT r.id, r.reviewer_id, u.username AS reviewer_username,
                   r.content, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.book_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn create(&self, book_id: i32, reviewer_id: i32, content: &str) -> AppResult<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (book_id, reviewer_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, book_id, reviewer_id, content, created_at
            "#,
        )
        .bind(book_id)
        .bind(reviewer_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }
}
