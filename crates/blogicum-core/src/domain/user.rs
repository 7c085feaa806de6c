use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate_text;
use crate::DomainError;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// User entity - a registered author or reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
    ) -> Result<Self, DomainError> {
        validate_text("username", &username, Some(MAX_USERNAME_LENGTH))?;
        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::Validation(
                "username: spaces are not allowed".to_string(),
            ));
        }
        validate_email(&email)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            username,
            first_name: String::new(),
            last_name: String::new(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an edit of the public profile fields.
    pub fn update_profile(
        &mut self,
        first_name: String,
        last_name: String,
        email: String,
    ) -> Result<(), DomainError> {
        validate_email(&email)?;
        self.first_name = first_name;
        self.last_name = last_name;
        self.email = email;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// "First Last", falling back to the username.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn as_author(&self) -> Author {
        Author {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// The public face of a user attached to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    if email.is_empty() {
        return Ok(());
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::Validation(
            "email: enter a valid email address".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_requires_username() {
        assert!(User::new(String::new(), String::new(), "hash".into()).is_err());
        assert!(User::new("two words".into(), String::new(), "hash".into()).is_err());
    }

    #[test]
    fn email_is_optional_but_checked() {
        assert!(User::new("reader".into(), String::new(), "hash".into()).is_ok());
        assert!(User::new("reader".into(), "nope".into(), "hash".into()).is_err());
        assert!(User::new("reader".into(), "reader@example.com".into(), "hash".into()).is_ok());
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let mut user = User::new("leo".into(), String::new(), "hash".into()).unwrap();
        assert_eq!(user.full_name(), "leo");

        user.update_profile("Leo".into(), "Tolstoy".into(), "leo@example.com".into())
            .unwrap();
        assert_eq!(user.full_name(), "Leo Tolstoy");
    }
}
