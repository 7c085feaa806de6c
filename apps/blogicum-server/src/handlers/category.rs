use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::PostQuery;
use blogicum_shared::dto::CategoryPostsResponse;

use super::{PageParams, mapping};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /category/{slug}/ - public posts of a published category.
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))?;

    let query = PostQuery::timeline(Utc::now())
        .in_category(category.id)
        .page(params.request(&state));
    let posts = state.posts.list(&query).await?;

    Ok(HttpResponse::Ok().json(CategoryPostsResponse {
        category: mapping::category(category),
        posts: mapping::page(posts, mapping::post),
    }))
}
