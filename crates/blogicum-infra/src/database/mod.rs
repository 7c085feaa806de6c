//! Persistence: PostgreSQL repositories and the in-memory store.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
mod postgres_repo;

pub use connections::DatabaseConfig;
pub use memory::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPostRepository, InMemoryStore, InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};
