use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Author, validate_text};
use crate::DomainError;
use crate::policy::Authored;

/// A reader's comment under a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment on `post_id` attributed to `author_id`.
    pub fn new(post_id: Uuid, author_id: Uuid, text: String) -> Result<Self, DomainError> {
        validate_text("text", &text, None)?;
        Ok(Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text,
            created_at: Utc::now(),
        })
    }

    pub fn edit(&mut self, text: String) -> Result<(), DomainError> {
        validate_text("text", &text, None)?;
        self.text = text;
        Ok(())
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// A comment together with its author, as shown under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: Author,
}
