use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MAX_TITLE_LENGTH, short_label, validate_text};
use crate::DomainError;

/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 64;

/// A thematic section of the blog, addressed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: String, description: String, slug: String) -> Result<Self, DomainError> {
        validate_text("title", &title, Some(MAX_TITLE_LENGTH))?;
        validate_text("description", &description, None)?;
        validate_slug(&slug)?;

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            slug,
            is_published: true,
            created_at: Utc::now(),
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_label(&self.title))
    }
}

/// Slugs are latin letters, digits, hyphen and underscore.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    let valid_chars = slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if slug.is_empty() || !valid_chars || slug.len() > MAX_SLUG_LENGTH {
        return Err(DomainError::Validation(format!(
            "slug: '{slug}' must be 1-{MAX_SLUG_LENGTH} latin letters, digits, hyphens or underscores"
        )));
    }
    Ok(())
}
