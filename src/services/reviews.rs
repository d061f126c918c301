//! Reader reviews

use validator::Validate;

use crate::{
    error::AppResult,
    models::review::{Review, ReviewForm},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Store a review by `reviewer_id` on `book_id`
    pub async fn post_review(
        &self,
        reviewer_id: i32,
        book_id: i32,
        form: ReviewForm,
    ) -> AppResult<Review> {
        let form = form.normalized();
        form.validate()?;

        self.repository.books.get_short(book_id).await?;

        let review = self
            .repository
            .reviews
            .create(book_id, reviewer_id, &form.content)
            .await?;

        tracing::info!(review_id = review.id, book_id = book_id, reviewer_id = reviewer_id, "Review posted");
        Ok(review)
    }
}
