use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Author, Category, Location, MAX_TITLE_LENGTH, short_label, validate_text};
use crate::DomainError;
use crate::policy::Authored;

/// Post entity - a blog publication, possibly scheduled for the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `author_id` from a validated draft.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Result<Self, DomainError> {
        draft.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            image: draft.image,
            location_id: draft.location_id,
            category_id: Some(draft.category_id),
            is_published: draft.is_published,
            created_at: Utc::now(),
        })
    }

    /// Replace the editable fields. Author and creation time never change.
    pub fn apply(&mut self, draft: PostDraft) -> Result<(), DomainError> {
        draft.validate()?;
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.image = draft.image;
        self.location_id = draft.location_id;
        self.category_id = Some(draft.category_id);
        self.is_published = draft.is_published;
        Ok(())
    }
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_label(&self.title))
    }
}

/// Author-supplied post fields.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub location_id: Option<Uuid>,
    pub category_id: Uuid,
    pub is_published: bool,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_text("title", &self.title, Some(MAX_TITLE_LENGTH))?;
        validate_text("text", &self.text, None)?;
        if let Some(image) = &self.image {
            validate_text("image", image, None)?;
        }
        Ok(())
    }
}

/// A post with its eagerly loaded relations and comment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEntry {
    pub post: Post,
    pub author: Author,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}

impl Authored for PostEntry {
    fn author_id(&self) -> Uuid {
        self.post.author_id
    }
}
