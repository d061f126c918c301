//! Business logic services

pub mod catalog;
pub mod lending;
pub mod reviews;
pub mod sessions;
pub mod users;

use crate::{
    config::{AuthConfig, CatalogConfig, SessionConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub reviews: reviews::ReviewsService,
    pub users: users::UsersService,
    pub sessions: sessions::SessionService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        catalog_config: CatalogConfig,
        session_config: SessionConfig,
        redis_client: redis::Client,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), catalog_config.clone()),
            lending: lending::LendingService::new(repository.clone(), catalog_config),
            reviews: reviews::ReviewsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            sessions: sessions::SessionService::new(redis_client, session_config),
            repository,
        }
    }

    /// Check that both backing stores answer
    pub async fn check_ready(&self) -> AppResult<()> {
        self.repository.ping().await?;
        self.sessions.ping().await
    }
}
