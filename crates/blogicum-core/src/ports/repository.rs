use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use crate::error::RepoError;
use crate::pagination::Page;
use crate::query::PostQuery;
use crate::visibility::Visibility;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    /// All locations, newest first.
    async fn list_all(&self) -> Result<Vec<Location>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// All categories, newest first.
    async fn list_all(&self) -> Result<Vec<Category>, RepoError>;
}

/// Post repository.
///
/// Deleting a post removes its comments.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Load a single post with relations and comment count, if `visibility` admits it.
    async fn find_entry(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<PostEntry>, RepoError>;

    /// Run a listing query: filter, annotate comment counts, order by
    /// `pub_date` descending and paginate.
    async fn list(&self, query: &PostQuery) -> Result<Page<PostEntry>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post in display order (oldest first), with authors.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError>;
}
