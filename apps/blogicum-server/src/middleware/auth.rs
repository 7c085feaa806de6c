//! Authentication extractors.
//!
//! A request is authenticated by `Authorization: Bearer <jwt>` or by the
//! [`AUTH_COOKIE`] set at login. Handlers that take an [`Identity`] send
//! anonymous visitors to the login page with a `next` parameter pointing
//! back at the original URL.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};
use uuid::Uuid;

use blogicum_core::ports::{AuthError, TokenClaims};

use crate::state::AppState;

/// Cookie carrying the access token for browser sessions.
pub const AUTH_COOKIE: &str = "blogicum_token";

pub const LOGIN_PATH: &str = "/auth/login/";

/// Authenticated user identity extractor.
///
/// ```ignore
/// async fn create_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Where a request's credentials came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Cookie(String),
}

impl Credentials {
    /// The bearer header wins over the cookie.
    pub fn from_request(req: &HttpRequest) -> Result<Option<Self>, AuthError> {
        if let Some(value) = req.headers().get(header::AUTHORIZATION) {
            let value = value
                .to_str()
                .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
            let token = value
                .strip_prefix("Bearer ")
                .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;
            return Ok(Some(Self::Bearer(token.to_string())));
        }

        Ok(req
            .cookie(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .map(Self::Cookie))
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Bearer(token) | Self::Cookie(token) => token,
        }
    }
}

/// Login URL that brings the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    match serde_urlencoded::to_string(&[("next", next)]) {
        Ok(query) => format!("{LOGIN_PATH}?{query}"),
        Err(_) => LOGIN_PATH.to_string(),
    }
}

/// Authentication failure. Answered with a redirect to the login page.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct AuthenticationError {
    pub error: AuthError,
    /// Path and query of the rejected request.
    pub next: String,
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        tracing::debug!(error = %self.error, next = %self.next, "Redirecting to login");
        HttpResponse::Found()
            .insert_header((header::LOCATION, login_url(&self.next)))
            .finish()
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AuthError::InvalidToken("Server configuration error".to_string())
    })?;

    let credentials = Credentials::from_request(req)?.ok_or(AuthError::MissingAuth)?;
    let claims = state.tokens.validate_token(credentials.token())?;

    Ok(Identity::from(claims))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|error| AuthenticationError {
            error,
            next: req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| req.path().to_string()),
        }))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}
