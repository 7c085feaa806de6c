//! Registration, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, http::header, web};

use blogicum_core::domain::User;
use blogicum_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use crate::middleware::auth::AUTH_COOKIE;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "password: must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = state.passwords.hash(&req.password)?;

    let mut user = User::new(req.username, req.email, password_hash)?;
    user.first_name = req.first_name;
    user.last_name = req.last_name;
    let user = state.users.save(user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let auth = issue_token(&state, &user)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(session_cookie(&auth))
        .json(auth))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(username = %req.username, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    let auth = issue_token(&state, &user)?;
    Ok(HttpResponse::Ok().cookie(session_cookie(&auth)).json(auth))
}

/// POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(AUTH_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish()
}

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

fn session_cookie(auth: &AuthResponse) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, auth.access_token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(auth.expires_in as i64))
        .finish()
}
