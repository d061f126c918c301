//! Redis-backed anonymous sessions

use redis::Client;
use uuid::Uuid;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct SessionService {
    client: Client,
    config: SessionConfig,
}

impl SessionService {
    /// No connection is made until the first command
    pub fn new(client: Client, config: SessionConfig) -> Self {
        Self { client, config }
    }

    /// Open a Redis client for `url` without connecting
    pub fn open_client(url: &str) -> AppResult<Client> {
        Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Session id from a cookie value, if well formed
    pub fn parse_id(value: &str) -> Option<Uuid> {
        Uuid::parse_str(value.trim()).ok()
    }

    pub fn new_id() -> Uuid {
        Uuid::new_v4()
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }

    /// Count one more visit for the session and refresh its lifetime.
    ///
    /// Returns the number of visits including this one.
    pub async fn record_visit(&self, session_id: Uuid) -> AppResult<i64> {
        let mut conn = self.connection().await?;
        let key = visits_key(session_id);

        let (visits,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .expire(&key, self.config.ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to record visit in Redis: {}", e)))?;

        Ok(visits)
    }
}

fn visits_key(session_id: Uuid) -> String {
    format!("session:{}:num_visits", session_id)
}
