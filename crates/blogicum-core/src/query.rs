//! Composable post listing queries.
//!
//! A [`PostQuery`] describes a listing: which posts are visible, optional
//! author/category restrictions and the requested page. Storage backends
//! translate it into their own query language; the functions here are the
//! reference pipeline used for in-memory data.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::DomainError;
use crate::domain::{Comment, PostEntry};
use crate::pagination::{Page, PageRequest};
use crate::visibility::Visibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub visibility: Visibility,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub page: PageRequest,
}

impl PostQuery {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            author_id: None,
            category_id: None,
            page: PageRequest::default(),
        }
    }

    /// The public timeline.
    pub fn timeline(now: DateTime<Utc>) -> Self {
        Self::new(Visibility::Published { now })
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn matches(&self, entry: &PostEntry) -> bool {
        self.author_id.is_none_or(|id| entry.post.author_id == id)
            && self
                .category_id
                .is_none_or(|id| entry.post.category_id == Some(id))
            && self.visibility.allows_entry(entry)
    }

    /// Filter, order newest first and paginate.
    pub fn run(
        &self,
        entries: impl IntoIterator<Item = PostEntry>,
    ) -> Result<Page<PostEntry>, DomainError> {
        let mut selected: Vec<PostEntry> =
            entries.into_iter().filter(|e| self.matches(e)).collect();
        newest_first(&mut selected);
        Page::slice(selected, self.page)
    }
}

/// Order by publication date, most recent first.
pub fn newest_first(entries: &mut [PostEntry]) {
    entries.sort_by(|a, b| {
        b.post
            .pub_date
            .cmp(&a.post.pub_date)
            .then_with(|| b.post.created_at.cmp(&a.post.created_at))
            .then_with(|| a.post.id.cmp(&b.post.id))
    });
}

/// Count comments per post.
pub fn count_comments<'a>(comments: impl IntoIterator<Item = &'a Comment>) -> HashMap<Uuid, u64> {
    let mut counts = HashMap::new();
    for comment in comments {
        *counts.entry(comment.post_id).or_insert(0) += 1;
    }
    counts
}

/// Attach comment counts; posts absent from `counts` get zero.
pub fn annotate_comment_counts(entries: &mut [PostEntry], counts: &HashMap<Uuid, u64>) {
    for entry in entries {
        entry.comment_count = counts.get(&entry.post.id).copied().unwrap_or(0);
    }
}
