//! HTTP handlers for the library catalog

pub mod admin;
pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod index;
pub mod lending;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for the reader behind a bearer token.
///
/// Requests without a usable token are sent to the login page.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::LoginRequired("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::LoginRequired("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::LoginRequired("Session expired, please log in again".to_string())
        })?;

        Ok(AuthenticatedUser(claims))
    }
}

/// JSON body whose rejections come back as field errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route("/genres", get(admin::list_genres).post(admin::create_genre))
        .route("/genres/:id", put(admin::update_genre).delete(admin::delete_genre))
        .route("/authors", post(admin::create_author))
        .route("/authors/:id", put(admin::update_author).delete(admin::delete_author))
        .route("/books", get(admin::list_books).post(admin::create_book))
        .route("/books/:id", put(admin::update_book).delete(admin::delete_book))
        .route("/books/:id/instances", get(admin::list_book_instances))
        .route(
            "/bookinstances",
            get(admin::list_instances).post(admin::create_instance),
        )
        .route(
            "/bookinstances/:id",
            get(admin::get_instance)
                .patch(admin::patch_instance)
                .delete(admin::delete_instance),
        );

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Landing page
        .route("/", get(index::index))
        // Catalog
        .route("/authors", get(authors::list_authors))
        .route("/author/:id", get(authors::get_author))
        .route("/books", get(books::list_books))
        .route("/book/:id", get(books::get_book).post(books::post_review))
        // Lending
        .route("/books/my", get(lending::my_books))
        .route(
            "/book/reserve",
            get(lending::reservation_form).post(lending::reserve),
        )
        .route(
            "/bookinstance/:id",
            get(lending::get_instance)
                .put(lending::take_or_extend)
                .delete(lending::return_instance),
        )
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", get(auth::login_info).post(auth::login))
        .route("/auth/me", get(auth::me))
        .nest("/admin", admin_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
