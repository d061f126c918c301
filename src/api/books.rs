//! Book listing, detail and review endpoints

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{HeaderName, LOCATION},
        StatusCode,
    },
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, BookListEntry},
        review::{ReviewForm, ReviewPosted},
        ListQuery, Page,
    },
    AppState,
};

use super::{AppJson, AuthenticatedUser};

/// List books
#[utoipa::path(
    get,
    path = "/books",
    tag = "catalog",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<BookListEntry>>> {
    let page = state
        .services
        .catalog
        .list_books(query.search(), query.page.as_deref())
        .await?;
    Ok(Json(page))
}

/// Get book with genres, copies and reviews
#[utoipa::path(
    get,
    path = "/book/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Post a review on a book
#[utoipa::path(
    post,
    path = "/book/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = ReviewForm,
    responses(
        (status = 201, description = "Review stored", body = ReviewPosted),
        (status = 303, description = "Login required"),
        (status = 400, description = "Invalid review", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn post_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(form): AppJson<ReviewForm>,
) -> AppResult<(StatusCode, [(HeaderName, String); 1], Json<ReviewPosted>)> {
    let review = state
        .services
        .reviews
        .post_review(claims.user_id, id, form)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/v1/book/{}", id))],
        Json(ReviewPosted {
            message: "Your review was posted successfully".to_string(),
            review,
        }),
    ))
}
