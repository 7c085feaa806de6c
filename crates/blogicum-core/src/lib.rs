//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog.
//! Entities, the post visibility rules, pagination and the ownership policy
//! live here, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod query;
pub mod visibility;

pub use error::{DomainError, RepoError};
pub use pagination::{Page, PageRequest};
pub use policy::{Authored, can_edit};
pub use query::PostQuery;
pub use visibility::Visibility;
