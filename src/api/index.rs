//! Landing page

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, services::sessions::SessionService, AppState};

#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    /// Visits of the landing page in the current session, this one included
    pub num_visits: i64,
}

/// Catalog summary and per-session visit counter
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let sessions = &state.services.sessions;

    let existing = jar
        .get(sessions.cookie_name())
        .and_then(|c| SessionService::parse_id(c.value()));

    let (jar, session_id) = match existing {
        Some(id) => (jar, id),
        None => {
            let id = SessionService::new_id();
            let cookie = Cookie::build((sessions.cookie_name().to_string(), id.to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), id)
        }
    };

    let summary = state.services.catalog.summary().await?;
    let num_visits = sessions.record_visit(session_id).await?;

    Ok((
        jar,
        Json(IndexResponse {
            num_books: summary.num_books,
            num_instances: summary.num_instances,
            num_instances_available: summary.num_instances_available,
            num_authors: summary.num_authors,
            num_visits,
        }),
    ))
}
