//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Author, Category, CommentEntry, Location, PostEntry, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::Page;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_core::query::{PostQuery, annotate_comment_counts};
use blogicum_core::visibility::Visibility;

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL post repository. Comments go with their post through the
/// `ON DELETE CASCADE` foreign key.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_desc(location::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_desc(category::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Public visibility as a SQL condition. Needs the category join.
fn published_condition(now: chrono::DateTime<chrono::Utc>) -> Condition {
    Condition::all()
        .add(post::Column::IsPublished.eq(true))
        .add(post::Column::PubDate.lte(now.fixed_offset()))
        .add(category::Column::IsPublished.eq(true))
}

/// Restrict a post select to what `visibility` admits.
fn visible(select: Select<PostEntity>, visibility: Visibility) -> Select<PostEntity> {
    match visibility {
        Visibility::All => select,
        Visibility::Published { now } => select
            .join(JoinType::LeftJoin, post::Relation::Category.def())
            .filter(published_condition(now)),
        Visibility::PublishedOrAuthor { now, viewer } => select
            .join(JoinType::LeftJoin, post::Relation::Category.def())
            .filter(
                Condition::any()
                    .add(published_condition(now))
                    .add(post::Column::AuthorId.eq(viewer)),
            ),
    }
}

/// Translate a listing query into a select ordered newest first.
pub(super) fn listing(query: &PostQuery) -> Select<PostEntity> {
    let mut select = PostEntity::find();
    if let Some(author_id) = query.author_id {
        select = select.filter(post::Column::AuthorId.eq(author_id));
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(post::Column::CategoryId.eq(category_id));
    }

    visible(select, query.visibility)
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::CreatedAt)
        .order_by_asc(post::Column::Id)
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: Uuid,
    comment_count: i64,
}

impl PostgresPostRepository {
    /// Eager-load authors, categories and locations and attach comment
    /// counts for a batch of posts. Input order is preserved.
    async fn load_entries(&self, models: Vec<post::Model>) -> Result<Vec<PostEntry>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let author_ids: Vec<Uuid> = models.iter().map(|m| m.author_id).collect();
        let category_ids: Vec<Uuid> = models.iter().filter_map(|m| m.category_id).collect();
        let location_ids: Vec<Uuid> = models.iter().filter_map(|m| m.location_id).collect();

        let authors: HashMap<Uuid, Author> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|m| (m.id, Author::from(m)))
            .collect();

        let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(query_error)?
                .into_iter()
                .map(|m| (m.id, Category::from(m)))
                .collect()
        };

        let locations: HashMap<Uuid, Location> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            LocationEntity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(query_error)?
                .into_iter()
                .map(|m| (m.id, Location::from(m)))
                .collect()
        };

        // Posts without comments are simply absent from the grouped result.
        let counts: HashMap<Uuid, u64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "comment_count")
            .filter(comment::Column::PostId.is_in(post_ids))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|c| (c.post_id, c.comment_count.max(0) as u64))
            .collect();

        let mut entries = models
            .into_iter()
            .map(|model| {
                let author = authors.get(&model.author_id).cloned().ok_or_else(|| {
                    RepoError::Query(format!("author of post {} is missing", model.id))
                })?;
                let category = model.category_id.and_then(|id| categories.get(&id).cloned());
                let location = model.location_id.and_then(|id| locations.get(&id).cloned());

                Ok(PostEntry {
                    post: model.into(),
                    author,
                    category,
                    location,
                    comment_count: 0,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        annotate_comment_counts(&mut entries, &counts);
        Ok(entries)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_entry(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<PostEntry>, RepoError> {
        let model = visible(PostEntity::find().filter(post::Column::Id.eq(id)), visibility)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        match model {
            Some(model) => Ok(self.load_entries(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<PostEntry>, RepoError> {
        let paginator = listing(query).paginate(&self.db, query.page.per_page);

        let total_items = paginator.num_items().await.map_err(query_error)?;
        query.page.validate(total_items)?;

        let models = paginator
            .fetch_page(query.page.page - 1)
            .await
            .map_err(query_error)?;
        let entries = self.load_entries(models).await?;

        tracing::debug!(
            total_items,
            page = query.page.page,
            returned = entries.len(),
            "Post listing loaded"
        );

        Ok(Page::new(entries, query.page, total_items)?)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        rows.into_iter()
            .map(|(comment, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Query(format!("author of comment {} is missing", comment.id))
                })?;
                Ok(CommentEntry {
                    comment: comment.into(),
                    author: author.into(),
                })
            })
            .collect()
    }
}
