//! Ownership policy for edit and delete actions.

use uuid::Uuid;

/// Anything written by a single user.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

/// Only the author may edit or delete an entity.
pub fn can_edit<E: Authored + ?Sized>(entity: &E, requester: Uuid) -> bool {
    entity.author_id() == requester
}
