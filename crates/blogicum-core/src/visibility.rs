//! Post visibility rules.
//!
//! A post is public when it is published, its publication date has passed and
//! its category is published. Authors always see their own posts.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post, PostEntry};

/// Which posts a listing or lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No publication filter (an author browsing their own profile).
    All,
    /// Only publicly visible posts.
    Published { now: DateTime<Utc> },
    /// Publicly visible posts plus everything written by `viewer`.
    PublishedOrAuthor { now: DateTime<Utc>, viewer: Uuid },
}

impl Visibility {
    /// Visibility for a single-post lookup by an optional viewer.
    pub fn for_viewer(now: DateTime<Utc>, viewer: Option<Uuid>) -> Self {
        match viewer {
            Some(viewer) => Self::PublishedOrAuthor { now, viewer },
            None => Self::Published { now },
        }
    }

    /// Visibility for the profile listing of `owner`.
    pub fn for_profile(now: DateTime<Utc>, owner: Uuid, viewer: Option<Uuid>) -> Self {
        if viewer == Some(owner) {
            Self::All
        } else {
            Self::Published { now }
        }
    }

    pub fn allows(&self, post: &Post, category: Option<&Category>) -> bool {
        match *self {
            Self::All => true,
            Self::Published { now } => is_public(post, category, now),
            Self::PublishedOrAuthor { now, viewer } => {
                post.author_id == viewer || is_public(post, category, now)
            }
        }
    }

    pub fn allows_entry(&self, entry: &PostEntry) -> bool {
        self.allows(&entry.post, entry.category.as_ref())
    }
}

/// The public visibility predicate. A post without a category is never public.
pub fn is_public(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published
        && post.pub_date <= now
        && category.is_some_and(|c| c.is_published && Some(c.id) == post.category_id)
}
