//! Application configuration loaded from environment variables.

use std::env;

use blogicum_core::pagination::DEFAULT_PER_PAGE;
use blogicum_infra::{DatabaseConfig, JwtConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the blog on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub posts_per_page: u64,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            posts_per_page: parse_var("POSTS_PER_PAGE")
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PER_PAGE),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
