use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::Principal;
use crate::error::AppError;

/// Per-request state filled by the pipeline stages and read by handlers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub request_id: Option<String>,
}

/// Extractor for handlers behind an authenticated route.
///
/// Reads the principal the authentication gate attached; a handler reached
/// without one answers 401.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.principal.clone())
            .map(Authenticated)
            .ok_or_else(|| AppError::auth("unauthorized", "authentication required"))
    }
}
