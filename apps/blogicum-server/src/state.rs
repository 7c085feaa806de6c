//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PasswordService, PostRepository,
    TokenService, UserRepository,
};
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

#[cfg(feature = "postgres")]
use blogicum_infra::database::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository, connect,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub posts_per_page: u64,
}

impl AppState {
    /// Build the state from configuration, connecting to PostgreSQL when
    /// `DATABASE_URL` is set.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        let state = match &config.database {
            #[cfg(feature = "postgres")]
            Some(db_config) => {
                let db = connect(db_config).await?;
                Self {
                    users: Arc::new(PostgresUserRepository::new(db.clone())),
                    locations: Arc::new(PostgresLocationRepository::new(db.clone())),
                    categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
                    posts: Arc::new(PostgresPostRepository::new(db.clone())),
                    comments: Arc::new(PostgresCommentRepository::new(db)),
                    tokens,
                    passwords: Arc::new(Argon2PasswordService::new()),
                    posts_per_page: config.posts_per_page,
                }
            }
            #[cfg(not(feature = "postgres"))]
            Some(_) => {
                tracing::warn!(
                    "DATABASE_URL is set but the postgres feature is disabled. Using in-memory store."
                );
                Self::in_memory(InMemoryStore::new(), tokens, config.posts_per_page)
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running on the in-memory store.");
                Self::in_memory(InMemoryStore::new(), tokens, config.posts_per_page)
            }
        };

        tracing::info!(posts_per_page = state.posts_per_page, "Application state initialized");
        Ok(state)
    }

    /// State backed by a shared in-memory store.
    pub fn in_memory(
        store: InMemoryStore,
        tokens: Arc<dyn TokenService>,
        posts_per_page: u64,
    ) -> Self {
        Self {
            users: Arc::new(store.users()),
            locations: Arc::new(store.locations()),
            categories: Arc::new(store.categories()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            posts_per_page,
        }
    }
}
