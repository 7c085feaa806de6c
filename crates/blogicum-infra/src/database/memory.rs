//! In-memory storage - used when no database is configured and in tests.
//!
//! All repositories share one [`InMemoryStore`], so foreign keys, unique
//! constraints and delete cascades behave like the PostgreSQL schema.
//! Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::Page;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::query::{PostQuery, annotate_comment_counts, count_comments};
use blogicum_core::visibility::Visibility;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    locations: HashMap<Uuid, Location>,
    categories: HashMap<Uuid, Category>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn entry(&self, post: &Post) -> Result<PostEntry, RepoError> {
        let author = self
            .users
            .get(&post.author_id)
            .map(User::as_author)
            .ok_or_else(|| RepoError::Query(format!("author of post {} is missing", post.id)))?;

        Ok(PostEntry {
            post: post.clone(),
            author,
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
            comment_count: 0,
        })
    }

    fn check_post_references(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "post author {} does not exist",
                post.author_id
            )));
        }
        if let Some(id) = post.category_id {
            if !self.categories.contains_key(&id) {
                return Err(RepoError::Constraint(format!("category {id} does not exist")));
            }
        }
        if let Some(id) = post.location_id {
            if !self.locations.contains_key(&id) {
                return Err(RepoError::Constraint(format!("location {id} does not exist")));
            }
        }
        Ok(())
    }

    fn remove_post(&mut self, post_id: Uuid) -> Option<Post> {
        let post = self.posts.remove(&post_id)?;
        self.comments.retain(|_, c| c.post_id != post_id);
        Some(post)
    }
}

/// Shared in-memory tables behind an async `RwLock`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository(self.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryLocationRepository(self.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository(self.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository(self.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository(self.clone())
    }
}

pub struct InMemoryUserRepository(InMemoryStore);

pub struct InMemoryLocationRepository(InMemoryStore);

pub struct InMemoryCategoryRepository(InMemoryStore);

pub struct InMemoryPostRepository(InMemoryStore);

pub struct InMemoryCommentRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.0.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Removes the user's posts (with their comments) and comments.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryLocationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        Ok(self.0.tables.read().await.locations.get(&id).cloned())
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    /// Posts keep existing with their location cleared.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.locations.remove(&id).ok_or(RepoError::NotFound)?;
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let mut locations: Vec<Location> =
            self.0.tables.read().await.locations.values().cloned().collect();
        locations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(locations)
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.0.tables.read().await.categories.get(&id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.0.tables.write().await;
        let taken = tables
            .categories
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is already used",
                category.slug
            )));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    /// Posts keep existing with their category cleared.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.categories.remove(&id).ok_or(RepoError::NotFound)?;
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let mut categories: Vec<Category> =
            self.0.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.0.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.check_post_references(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.remove_post(id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_entry(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<PostEntry>, RepoError> {
        let tables = self.0.tables.read().await;
        let Some(post) = tables.posts.get(&id) else {
            return Ok(None);
        };

        let counts = count_comments(tables.comments.values().filter(|c| c.post_id == id));
        let mut entry = tables.entry(post)?;
        annotate_comment_counts(std::slice::from_mut(&mut entry), &counts);
        Ok(visibility.allows_entry(&entry).then_some(entry))
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<PostEntry>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut entries = tables
            .posts
            .values()
            .map(|post| tables.entry(post))
            .collect::<Result<Vec<_>, _>>()?;
        annotate_comment_counts(&mut entries, &count_comments(tables.comments.values()));

        Ok(query.run(entries)?)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.0.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.0.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint(format!(
                "comment author {} does not exist",
                comment.author_id
            )));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let tables = self.0.tables.read().await;

        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        comments
            .into_iter()
            .map(|comment| {
                let author = tables
                    .users
                    .get(&comment.author_id)
                    .map(User::as_author)
                    .ok_or_else(|| {
                        RepoError::Query(format!("author of comment {} is missing", comment.id))
                    })?;
                Ok(CommentEntry {
                    comment: comment.clone(),
                    author,
                })
            })
            .collect()
    }
}
