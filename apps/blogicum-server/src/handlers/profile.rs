//! Profile handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::{PostQuery, Visibility};
use blogicum_shared::dto::{ProfileRequest, ProfileResponse};

use super::{PageParams, mapping, profile_url, redirect_with};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /profile/{username}/
///
/// The owner sees every post they wrote; other visitors see public posts.
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: OptionalIdentity,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))?;

    let viewer = identity.user_id();
    let query = PostQuery::new(Visibility::for_profile(Utc::now(), user.id, viewer))
        .by_author(user.id)
        .page(params.request(&state));
    let posts = state.posts.list(&query).await?;

    let is_owner = viewer == Some(user.id);
    Ok(HttpResponse::Ok().json(ProfileResponse {
        profile: mapping::user(user, is_owner),
        posts: mapping::page(posts, mapping::post),
    }))
}

/// GET /edit_profile/
pub async fn edit_form(identity: Identity, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(mapping::user(user, true)))
}

/// POST /edit_profile/
pub async fn edit(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<ProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let mut user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    user.update_profile(req.first_name, req.last_name, req.email)?;
    let user = state.users.save(user).await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(redirect_with(
        &profile_url(&user.username),
        &mapping::user(user, true),
    ))
}
