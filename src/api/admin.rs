//! Staff-only catalog administration
//!
//! Every handler checks `is_staff` before touching the catalog.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookFilter, BookListEntry, CreateBook, UpdateBook},
        book_instance::{
            BookInstanceDetails, BookInstanceFilter, CreateBookInstance, PatchBookInstance,
        },
        genre::{Genre, GenreForm},
        Page,
    },
    repository::books::BookSearch,
    AppState,
};

use super::{AppJson, AuthenticatedUser};

// =============================================================================
// GENRES
// =============================================================================

/// List genres
#[utoipa::path(
    get,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All genres", body = Vec<Genre>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Genre>>> {
    claims.require_staff()?;
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Create a genre
#[utoipa::path(
    post,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = GenreForm,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid genre", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only"),
        (status = 409, description = "Genre already exists")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(form): AppJson<GenreForm>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_staff()?;
    let genre = state.services.catalog.create_genre(&form).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Rename a genre
#[utoipa::path(
    put,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreForm,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(form): AppJson<GenreForm>,
) -> AppResult<Json<Genre>> {
    claims.require_staff()?;
    let genre = state.services.catalog.update_genre(id, &form).await?;
    Ok(Json(genre))
}

/// Delete a genre
#[utoipa::path(
    delete,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// AUTHORS
// =============================================================================

/// Create an author
#[utoipa::path(
    post,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid author", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    claims.require_staff()?;
    let author = state.services.catalog.create_author(&data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Update an author
#[utoipa::path(
    put,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = UpdateAuthor,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateAuthor>,
) -> AppResult<Json<Author>> {
    claims.require_staff()?;
    let author = state.services.catalog.update_author(id, &data).await?;
    Ok(Json(author))
}

/// Delete an author and their books
#[utoipa::path(
    delete,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// BOOKS
// =============================================================================

/// List books with optional genre filter
#[utoipa::path(
    get,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(BookFilter),
    responses(
        (status = 200, description = "Page of books", body = BookPage),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(filter): Query<BookFilter>,
) -> AppResult<Json<Page<BookListEntry>>> {
    claims.require_staff()?;
    let search = BookSearch {
        text: filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()),
        genre_id: filter.genre_id,
    };
    let page = state
        .services
        .catalog
        .search_books(search, filter.page.as_deref())
        .await?;
    Ok(Json(page))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_staff()?;
    let book = state.services.catalog.create_book(&data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(data): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_staff()?;
    let book = state.services.catalog.update_book(id, &data).await?;
    Ok(Json(book))
}

/// Delete a book with its copies and reviews
#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Copies of a book
#[utoipa::path(
    get,
    path = "/admin/books/{id}/instances",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Copies of the book", body = Vec<BookInstanceDetails>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BookInstanceDetails>>> {
    claims.require_staff()?;
    let instances = state.services.lending.list_book_instances(id).await?;
    Ok(Json(instances))
}

// =============================================================================
// BOOK INSTANCES
// =============================================================================

/// Search copies
#[utoipa::path(
    get,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(BookInstanceFilter),
    responses(
        (status = 200, description = "Page of copies", body = BookInstancePage),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_instances(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(filter): Query<BookInstanceFilter>,
) -> AppResult<Json<Page<BookInstanceDetails>>> {
    claims.require_staff()?;
    let page = state.services.lending.list_instances(&filter).await?;
    Ok(Json(page))
}

/// Add a copy of a book
#[utoipa::path(
    post,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstanceDetails),
        (status = 400, description = "Invalid copy", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstanceDetails>)> {
    claims.require_staff()?;
    let instance = state.services.lending.create_instance(&data).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Get any copy
#[utoipa::path(
    get,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Book instance", body = BookInstanceDetails),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_staff()?;
    let instance = state.services.lending.get_instance(id).await?;
    Ok(Json(instance))
}

/// Edit status, due-back date or reader of a copy
#[utoipa::path(
    patch,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = PatchBookInstance,
    responses(
        (status = 200, description = "Copy updated", body = BookInstanceDetails),
        (status = 400, description = "Reader set on an idle copy", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn patch_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    AppJson(patch): AppJson<PatchBookInstance>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_staff()?;
    let instance = state.services.lending.patch_instance(id, &patch).await?;
    Ok(Json(instance))
}

/// Delete a copy
#[utoipa::path(
    delete,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.lending.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
