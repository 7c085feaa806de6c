//! HTTP handlers and route configuration.

mod auth;
mod category;
mod comments;
mod mapping;
mod posts;
mod profile;

#[cfg(test)]
mod tests;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use blogicum_core::pagination::PageRequest;
use blogicum_shared::ErrorResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/", web::get().to(posts::index))
        .service(
            web::scope("/posts")
                // Registered before `/{post_id}/` so "create" is never parsed as an id.
                .service(
                    web::resource("/create/")
                        .route(web::get().to(posts::create_form))
                        .route(web::post().to(posts::create)),
                )
                .route("/{post_id}/", web::get().to(posts::detail))
                .route("/{post_id}/comment/", web::post().to(comments::add))
                .service(
                    web::resource("/{post_id}/edit/")
                        .route(web::get().to(posts::edit_form))
                        .route(web::post().to(posts::edit)),
                )
                .service(
                    web::resource("/{post_id}/delete/")
                        .route(web::get().to(posts::delete_form))
                        .route(web::post().to(posts::delete)),
                )
                .service(
                    web::resource("/{post_id}/edit_comment/{comment_id}")
                        .route(web::get().to(comments::edit_form))
                        .route(web::post().to(comments::edit)),
                )
                .service(
                    web::resource("/{post_id}/delete_comment/{comment_id}/")
                        .route(web::get().to(comments::delete_form))
                        .route(web::post().to(comments::delete)),
                ),
        )
        .route("/profile/{username}/", web::get().to(profile::profile))
        .service(
            web::resource("/edit_profile/")
                .route(web::get().to(profile::edit_form))
                .route(web::post().to(profile::edit)),
        )
        .route("/category/{slug}/", web::get().to(category::category_posts))
        .service(
            web::scope("/auth")
                .route("/registration/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/logout/", web::post().to(auth::logout)),
        );
}

/// Fallback for unknown routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("The requested page does not exist.").with_instance(req.path()),
    )
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Identifiers that do not parse cannot name an existing entity.
fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Unparseable path parameter");
    AppError::NotFound("The requested page does not exist.".to_string()).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(format!("Invalid page: {err}")).into()
}

/// `?page=N` on paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
}

impl PageParams {
    pub fn request(&self, state: &AppState) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), state.posts_per_page)
    }
}

pub fn post_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

/// 302 to `location` with the written entity as the body.
pub fn redirect_with<T: Serialize>(location: &str, body: &T) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .json(body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
