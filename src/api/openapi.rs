//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, authors, books, health, index, lending};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "0.3.0",
        description = "Authors, books, reservations and reviews of a local library"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        index::index,
        authors::list_authors,
        authors::get_author,
        books::list_books,
        books::get_book,
        // Reviews
        books::post_review,
        // Lending
        lending::my_books,
        lending::reservation_form,
        lending::reserve,
        lending::get_instance,
        lending::take_or_extend,
        lending::return_instance,
        // Auth
        auth::register,
        auth::login_info,
        auth::login,
        auth::me,
        // Admin
        admin::list_genres,
        admin::create_genre,
        admin::update_genre,
        admin::delete_genre,
        admin::create_author,
        admin::update_author,
        admin::delete_author,
        admin::list_books,
        admin::create_book,
        admin::update_book,
        admin::delete_book,
        admin::list_book_instances,
        admin::list_instances,
        admin::create_instance,
        admin::get_instance,
        admin::patch_instance,
        admin::delete_instance,
    ),
    components(
        schemas(
            // Catalog
            index::IndexResponse,
            crate::models::author::Author,
            crate::models::author::AuthorListEntry,
            crate::models::author::AuthorDetails,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookListEntry,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::genre::Genre,
            crate::models::genre::GenreForm,
            crate::models::pagination::AuthorPage,
            crate::models::pagination::BookPage,
            crate::models::pagination::BookInstancePage,
            // Lending
            crate::models::book_instance::BookStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BookInstanceDetails,
            crate::models::book_instance::LendingAction,
            crate::models::book_instance::LendingUpdate,
            crate::models::book_instance::CreateBookInstance,
            crate::models::book_instance::PatchBookInstance,
            crate::services::lending::ReservationForm,
            lending::ReturnResponse,
            // Reviews
            crate::models::review::Review,
            crate::models::review::ReviewDetails,
            crate::models::review::ReviewForm,
            crate::models::review::ReviewPosted,
            // Auth
            crate::models::user::User,
            crate::models::user::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LoginInfo,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Authors and books"),
        (name = "reviews", description = "Reader reviews"),
        (name = "lending", description = "Reservations, loans and returns"),
        (name = "auth", description = "Accounts and authentication"),
        (name = "admin", description = "Staff catalog administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_lending_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/bookinstance/{id}"));
        assert!(doc.paths.paths.contains_key("/book/reserve"));
        assert!(doc.paths.paths.contains_key("/admin/bookinstances/{id}"));
    }
}
