use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MAX_TITLE_LENGTH, short_label, validate_text};
use crate::DomainError;

/// A place a post can be tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: String) -> Result<Self, DomainError> {
        validate_text("name", &name, Some(MAX_TITLE_LENGTH))?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            is_published: true,
            created_at: Utc::now(),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_label(&self.name))
    }
}
