//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::can_edit;
use blogicum_core::domain::{Author, Comment, CommentEntry};
use blogicum_shared::dto::CommentRequest;

use super::{mapping, post_url, redirect, redirect_with};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /posts/{post_id}/comment/
///
/// Any existing post can be commented on, published or not.
pub async fn add(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    if state.posts.find_by_id(post_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Post {post_id} not found")));
    }

    let comment = Comment::new(post_id, identity.user_id, body.into_inner().text)?;
    let comment = state.comments.save(comment).await?;

    tracing::info!(
        %post_id,
        comment_id = %comment.id,
        user_id = %identity.user_id,
        "Comment added"
    );

    Ok(redirect_with(&post_url(post_id), &response(comment, &identity)))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&state, post_id, comment_id, &identity).await?;

    Ok(HttpResponse::Ok().json(response(comment, &identity)))
}

/// POST /posts/{post_id}/edit_comment/{comment_id}
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let mut comment = owned_comment(&state, post_id, comment_id, &identity).await?;
    comment.edit(body.into_inner().text)?;
    let comment = state.comments.save(comment).await?;

    tracing::info!(%post_id, %comment_id, user_id = %identity.user_id, "Comment updated");

    Ok(redirect_with(&post_url(post_id), &response(comment, &identity)))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&state, post_id, comment_id, &identity).await?;

    Ok(HttpResponse::Ok().json(response(comment, &identity)))
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&state, post_id, comment_id, &identity).await?;
    state.comments.delete(comment.id).await?;

    tracing::info!(%post_id, %comment_id, user_id = %identity.user_id, "Comment deleted");

    Ok(redirect(&post_url(post_id)))
}

/// A comment is addressed through its own post only.
async fn owned_comment(
    state: &AppState,
    post_id: Uuid,
    comment_id: Uuid,
    identity: &Identity,
) -> AppResult<Comment> {
    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id} not found")))?;

    if !can_edit(&comment, identity.user_id) {
        tracing::debug!(%comment_id, user_id = %identity.user_id, "Not the author of this comment");
        return Err(AppError::Redirect(post_url(post_id)));
    }

    Ok(comment)
}

/// The requester is the comment's author on every path through here.
fn response(comment: Comment, identity: &Identity) -> blogicum_shared::dto::CommentResponse {
    mapping::comment(CommentEntry {
        comment,
        author: Author {
            id: identity.user_id,
            username: identity.username.clone(),
        },
    })
}
