//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::{Comment, CommentEntry};
pub use location::Location;
pub use post::{Post, PostDraft, PostEntry};
pub use user::{Author, User};

/// Number of characters kept when an entity is shown by its name or title.
pub const DISPLAY_LABEL_LIMIT: usize = 20;

/// Maximum length of titles and names.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Truncate a label for compact display (admin-style listings, logs).
pub(crate) fn short_label(label: &str) -> &str {
    match label.char_indices().nth(DISPLAY_LABEL_LIMIT) {
        Some((idx, _)) => &label[..idx],
        None => label,
    }
}

/// Reject blank values and values longer than `max` characters.
pub(crate) fn validate_text(
    field: &str,
    value: &str,
    max: Option<usize>,
) -> Result<(), crate::DomainError> {
    if value.trim().is_empty() {
        return Err(crate::DomainError::Validation(format!(
            "{field}: this field is required"
        )));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(crate::DomainError::Validation(format!(
                "{field}: ensure this value has at most {max} characters"
            )));
        }
    }
    Ok(())
}
