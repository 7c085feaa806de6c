//! # Blogicum Infrastructure
//!
//! Concrete implementations of the ports defined in `blogicum-core`:
//! repositories (PostgreSQL via SeaORM, or in-memory) and authentication.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, InMemoryStore};
