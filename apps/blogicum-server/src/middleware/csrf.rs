//! Cross-site request forgery protection for cookie sessions.
//!
//! Unsafe requests that authenticate through the session cookie (no
//! `Authorization` header) must come from this site: the host of `Origin`,
//! or `Referer` when `Origin` is absent, has to equal the request host.
//! Bearer-token clients are not exposed to CSRF and pass through.

use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, Uri, header, uri::Authority},
};
use blogicum_shared::ErrorResponse;

use super::auth::AUTH_COOKIE;

/// CSRF middleware factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfProtection;

impl<S, B> Transform<S, ServiceRequest> for CsrfProtection
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfProtectionService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfProtectionService { service }))
    }
}

pub struct CsrfProtectionService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CsrfProtectionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if needs_check(&req) && !same_origin(&req) {
            tracing::warn!(
                method = %req.method(),
                path = %req.path(),
                "CSRF verification failed"
            );

            let response = HttpResponse::Forbidden().json(ErrorResponse::csrf_failure());
            let (http_req, _payload) = req.into_parts();
            let srv_response = ServiceResponse::new(http_req, response);

            return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn needs_check(req: &ServiceRequest) -> bool {
    !is_safe(req.method())
        && !req.headers().contains_key(header::AUTHORIZATION)
        && req.cookie(AUTH_COOKIE).is_some()
}

fn same_origin(req: &ServiceRequest) -> bool {
    let source = req
        .headers()
        .get(header::ORIGIN)
        .or_else(|| req.headers().get(header::REFERER))
        .and_then(|value| value.to_str().ok());

    let Some(authority) = source.and_then(source_authority) else {
        return false;
    };

    authority
        .as_str()
        .eq_ignore_ascii_case(req.connection_info().host())
}

/// Authority (`host[:port]`) of an absolute `Origin` or `Referer` value.
fn source_authority(value: &str) -> Option<Authority> {
    let uri: Uri = value.parse().ok()?;
    uri.scheme()?;
    uri.authority().cloned()
}
