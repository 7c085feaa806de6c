//! Post timeline, detail and authoring handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blogicum_core::domain::{Post, PostDraft, PostEntry};
use blogicum_core::{PostQuery, Visibility, can_edit};
use blogicum_shared::dto::{
    PostDetailResponse, PostFormResponse, PostRequest, PostUpdateRequest,
};

use super::{PageParams, mapping, post_url, profile_url, redirect, redirect_with};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET / - the public timeline.
pub async fn index(
    state: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let query = PostQuery::timeline(Utc::now()).page(params.request(&state));
    let page = state.posts.list(&query).await?;

    Ok(HttpResponse::Ok().json(mapping::page(page, mapping::post)))
}

/// GET /posts/{post_id}/
///
/// Unpublished, scheduled and hidden-category posts are shown to their
/// author only; everyone else gets a 404.
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let visibility = Visibility::for_viewer(Utc::now(), identity.user_id());

    let entry = state
        .posts
        .find_entry(post_id, visibility)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;
    let comments = state.comments.find_by_post(post_id).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: mapping::post(entry),
        comments: comments.into_iter().map(mapping::comment).collect(),
    }))
}

/// GET /posts/create/
pub async fn create_form(
    _identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(form(&state, None).await?))
}

/// POST /posts/create/
pub async fn create(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = draft(&state, body.into_inner()).await?;
    let post = Post::new(identity.user_id, draft)?;
    let post = state.posts.save(post).await?;

    tracing::info!(post_id = %post.id, user_id = %identity.user_id, "Post created");

    let entry = entry(&state, post.id).await?;
    Ok(redirect_with(
        &profile_url(&identity.username),
        &mapping::post(entry),
    ))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = owned_post(&state, path.into_inner(), &identity).await?;
    let entry = entry(&state, post.id).await?;

    Ok(HttpResponse::Ok().json(form(&state, Some(entry)).await?))
}

/// POST /posts/{post_id}/edit/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PostUpdateRequest>,
) -> AppResult<HttpResponse> {
    let mut post = owned_post(&state, path.into_inner(), &identity).await?;
    let revision = revision(&state, &post, body.into_inner()).await?;
    post.apply(revision)?;
    let post = state.posts.save(post).await?;

    tracing::info!(post_id = %post.id, user_id = %identity.user_id, "Post updated");

    let entry = entry(&state, post.id).await?;
    Ok(redirect_with(&post_url(post.id), &mapping::post(entry)))
}

/// GET /posts/{post_id}/delete/ - confirmation payload.
pub async fn delete_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = owned_post(&state, path.into_inner(), &identity).await?;
    let entry = entry(&state, post.id).await?;

    Ok(HttpResponse::Ok().json(mapping::post(entry)))
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = owned_post(&state, path.into_inner(), &identity).await?;
    state.posts.delete(post.id).await?;

    tracing::info!(post_id = %post.id, user_id = %identity.user_id, "Post deleted");

    Ok(redirect("/"))
}

/// Load a post for modification. Anyone but its author is sent back to
/// the post page.
async fn owned_post(state: &AppState, post_id: Uuid, identity: &Identity) -> AppResult<Post> {
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;

    if !can_edit(&post, identity.user_id) {
        tracing::debug!(%post_id, user_id = %identity.user_id, "Not the author of this post");
        return Err(AppError::Redirect(post_url(post_id)));
    }

    Ok(post)
}

async fn entry(state: &AppState, post_id: Uuid) -> AppResult<PostEntry> {
    state
        .posts
        .find_entry(post_id, Visibility::All)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))
}

/// Validate the submitted references and turn the form into a draft.
async fn draft(state: &AppState, req: PostRequest) -> AppResult<PostDraft> {
    let category_id = req.category_id.ok_or_else(category_required)?;
    check_references(state, category_id, req.location_id).await?;

    Ok(PostDraft {
        title: req.title,
        text: req.text,
        pub_date: req.pub_date.unwrap_or_else(Utc::now),
        image: req.image.filter(|image| !image.trim().is_empty()),
        location_id: req.location_id,
        category_id,
        is_published: req.is_published,
    })
}

/// Merge an edit into the stored post.
async fn revision(
    state: &AppState,
    post: &Post,
    req: PostUpdateRequest,
) -> AppResult<PostDraft> {
    let category_id = req
        .category_id
        .or(post.category_id)
        .ok_or_else(category_required)?;
    let location_id = req.location_id.unwrap_or(post.location_id);
    check_references(state, category_id, location_id).await?;

    Ok(PostDraft {
        title: req.title.unwrap_or_else(|| post.title.clone()),
        text: req.text.unwrap_or_else(|| post.text.clone()),
        pub_date: req.pub_date.unwrap_or(post.pub_date),
        image: req
            .image
            .unwrap_or_else(|| post.image.clone())
            .filter(|image| !image.trim().is_empty()),
        location_id,
        category_id,
        is_published: req.is_published.unwrap_or(post.is_published),
    })
}

fn category_required() -> AppError {
    AppError::BadRequest("category: this field is required".to_string())
}

async fn check_references(
    state: &AppState,
    category_id: Uuid,
    location_id: Option<Uuid>,
) -> AppResult<()> {
    if state.categories.find_by_id(category_id).await?.is_none() {
        return Err(AppError::BadRequest(
            "category: select a valid choice".to_string(),
        ));
    }
    if let Some(location_id) = location_id {
        if state.locations.find_by_id(location_id).await?.is_none() {
            return Err(AppError::BadRequest(
                "location: select a valid choice".to_string(),
            ));
        }
    }
    Ok(())
}

async fn form(state: &AppState, post: Option<PostEntry>) -> AppResult<PostFormResponse> {
    let categories = state.categories.list_all().await?;
    let locations = state.locations.list_all().await?;

    Ok(PostFormResponse {
        post: post.map(mapping::post),
        categories: categories.into_iter().map(mapping::category).collect(),
        locations: locations.into_iter().map(mapping::location).collect(),
    })
}
