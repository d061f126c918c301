//! Author listing and detail endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{AuthorDetails, AuthorListEntry},
        ListQuery, Page,
    },
    AppState,
};

/// List authors
#[utoipa::path(
    get,
    path = "/authors",
    tag = "catalog",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of authors", body = AuthorPage)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<AuthorListEntry>>> {
    let page = state
        .services
        .catalog
        .list_authors(query.search(), query.page.as_deref())
        .await?;
    Ok(Json(page))
}

/// Get author with their books
#[utoipa::path(
    get,
    path = "/author/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetails),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetails>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}
