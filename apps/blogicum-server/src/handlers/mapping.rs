//! Domain to response DTO conversions.

use blogicum_core::domain::{Author, Category, CommentEntry, Location, PostEntry, User};
use blogicum_core::pagination::Page;
use blogicum_shared::dto::{
    AuthorResponse, CategoryResponse, CommentResponse, LocationResponse, PageResponse,
    PostResponse, UserResponse,
};

pub fn author(author: Author) -> AuthorResponse {
    AuthorResponse {
        id: author.id,
        username: author.username,
    }
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
    }
}

pub fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
    }
}

pub fn post(entry: PostEntry) -> PostResponse {
    let PostEntry {
        post,
        author: post_author,
        category: post_category,
        location: post_location,
        comment_count,
    } = entry;

    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        image: post.image,
        is_published: post.is_published,
        created_at: post.created_at,
        author: author(post_author),
        category: post_category.map(category),
        location: post_location.map(location),
        comment_count,
    }
}

pub fn comment(entry: CommentEntry) -> CommentResponse {
    CommentResponse {
        id: entry.comment.id,
        post_id: entry.comment.post_id,
        text: entry.comment.text,
        created_at: entry.comment.created_at,
        author: author(entry.author),
    }
}

/// Public profile; the email is included for its owner only.
pub fn user(user: User, with_email: bool) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: with_email.then_some(user.email),
        created_at: user.created_at,
    }
}

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        page: page.number,
        per_page: page.per_page,
        num_pages: page.num_pages,
        total_items: page.total_items,
        has_next,
        has_previous,
    }
}
