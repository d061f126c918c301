//! Reader-side lending endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstance, BookInstanceDetails, LendingUpdate},
        Page,
    },
    services::lending::ReservationForm,
    AppState,
};

use super::AuthenticatedUser;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyBooksQuery {
    /// Page number (1-based, `last` for the final page)
    pub page: Option<String>,
}

/// Book to reserve, as given in the query string
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReserveQuery {
    pub book_id: Option<String>,
}

impl ReserveQuery {
    fn book_id(&self) -> AppResult<i32> {
        self.book_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::field("book_id", "This field is required"))?
            .parse()
            .map_err(|_| AppError::field("book_id", "Select a valid book"))
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub message: String,
    pub instance: BookInstance,
}

/// Copies lent to the current reader
#[utoipa::path(
    get,
    path = "/books/my",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(MyBooksQuery),
    responses(
        (status = 200, description = "Reader's copies, soonest due first", body = BookInstancePage),
        (status = 303, description = "Login required")
    )
)]
pub async fn my_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MyBooksQuery>,
) -> AppResult<Json<Page<BookInstanceDetails>>> {
    let page = state
        .services
        .lending
        .my_instances(claims.user_id, query.page.as_deref())
        .await?;
    Ok(Json(page))
}

/// Show what a reservation of a book would look like
#[utoipa::path(
    get,
    path = "/book/reserve",
    tag = "lending",
    params(ReserveQuery),
    responses(
        (status = 200, description = "Reservation form", body = ReservationForm),
        (status = 400, description = "Missing or invalid book id", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn reservation_form(
    State(state): State<AppState>,
    Query(query): Query<ReserveQuery>,
) -> AppResult<Json<ReservationForm>> {
    let form = state
        .services
        .lending
        .reservation_form(query.book_id()?)
        .await?;
    Ok(Json(form))
}

/// Reserve a new copy of a book for the current reader
#[utoipa::path(
    post,
    path = "/book/reserve",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(ReserveQuery),
    responses(
        (status = 201, description = "Copy reserved", body = BookInstanceDetails),
        (status = 303, description = "Login required"),
        (status = 400, description = "Missing or invalid book id", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn reserve(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReserveQuery>,
) -> AppResult<(StatusCode, Json<BookInstanceDetails>)> {
    let instance = state
        .services
        .lending
        .reserve(claims.user_id, query.book_id()?)
        .await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Get one of the reader's copies
#[utoipa::path(
    get,
    path = "/bookinstance/{id}",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Book instance", body = BookInstanceDetails),
        (status = 303, description = "Login required"),
        (status = 403, description = "Copy belongs to another reader"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let instance = state
        .services
        .lending
        .get_own_instance(claims.user_id, id)
        .await?;
    Ok(Json(instance))
}

/// Take a reserved copy, or extend a taken one
#[utoipa::path(
    put,
    path = "/bookinstance/{id}",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy taken or extended", body = LendingUpdate),
        (status = 303, description = "Login required"),
        (status = 403, description = "Copy belongs to another reader"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy cannot be taken in its current status")
    )
)]
pub async fn take_or_extend(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LendingUpdate>> {
    let update = state
        .services
        .lending
        .take_or_extend(claims.user_id, id)
        .await?;
    Ok(Json(update))
}

/// Return a copy
#[utoipa::path(
    delete,
    path = "/bookinstance/{id}",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy returned", body = ReturnResponse),
        (status = 303, description = "Login required"),
        (status = 403, description = "Copy belongs to another reader"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn return_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReturnResponse>> {
    let instance = state
        .services
        .lending
        .return_instance(claims.user_id, id)
        .await?;
    Ok(Json(ReturnResponse {
        message: "Book returned".to_string(),
        instance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(book_id: Option<&str>) -> ReserveQuery {
        ReserveQuery {
            book_id: book_id.map(str::to_string),
        }
    }

    #[test]
    fn test_reserve_book_id() {
        assert_eq!(query(Some(" 12 ")).book_id().unwrap(), 12);
        assert!(matches!(query(None).book_id(), Err(AppError::InvalidForm(_))));
        assert!(matches!(query(Some("")).book_id(), Err(AppError::InvalidForm(_))));
        assert!(matches!(query(Some("abc")).book_id(), Err(AppError::InvalidForm(_))));
    }
}
