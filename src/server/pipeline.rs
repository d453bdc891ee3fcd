//! Request pipeline run in front of every handler.
//!
//! Stages execute in declared order against the request head and a fresh
//! `RequestContext`. The first rejection ends the request; nothing behind the
//! pipeline runs. The context is stored in the request extensions afterwards.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::identity::{AuthorizationPolicy, Principal, RequestContext, Requirement, TokenError, Verifier};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, parts: &Parts, ctx: &mut RequestContext) -> Result<(), AppError>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self { Self { stages } }

    /// Authentication gate first, then request id stamping.
    pub fn standard(policy: AuthorizationPolicy, verifier: Arc<Verifier>) -> Self {
        Self::new(vec![Box::new(AuthenticationGate::new(policy, verifier)), Box::new(RequestIdStage)])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, parts: &Parts) -> Result<RequestContext, AppError> {
        let mut ctx = RequestContext::default();
        for stage in &self.stages {
            stage.run(parts, &mut ctx)?;
        }
        Ok(ctx)
    }
}

/// Middleware entry: `axum::middleware::from_fn_with_state(pipeline, pipeline::handle)`.
pub async fn handle(State(pipeline): State<Arc<Pipeline>>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let ctx = match pipeline.run(&parts) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };
    debug!(
        target: "http",
        method = %parts.method,
        path = %parts.uri.path(),
        request_id = ctx.request_id.as_deref().unwrap_or("-"),
        authenticated = ctx.principal.is_some(),
        "request admitted"
    );
    let request_id = ctx.request_id.clone();
    parts.extensions.insert(ctx);
    let mut response = next.run(Request::from_parts(parts, body)).await;
    if let Some(v) = request_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    response
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    MissingToken,
    Token(TokenError),
}

impl From<GateRejection> for AppError {
    fn from(r: GateRejection) -> Self {
        match r {
            GateRejection::MissingToken => AppError::auth("unauthorized", "authentication required"),
            GateRejection::Token(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Route needs no principal. Any token on the request was not looked at.
    Anonymous,
    Verified(Principal),
    Rejected(GateRejection),
}

/// Decides from the policy whether a request needs a principal and, if so,
/// verifies its bearer token. Never touches the account store.
pub struct AuthenticationGate {
    policy: AuthorizationPolicy,
    verifier: Arc<Verifier>,
}

impl AuthenticationGate {
    pub fn new(policy: AuthorizationPolicy, verifier: Arc<Verifier>) -> Self {
        Self { policy, verifier }
    }

    pub fn evaluate(&self, method: &Method, path: &str, headers: &HeaderMap) -> GateOutcome {
        if self.policy.requirement_for(method, path) == Requirement::Anonymous {
            return GateOutcome::Anonymous;
        }
        let Some(token) = bearer_token(headers) else {
            return GateOutcome::Rejected(GateRejection::MissingToken);
        };
        match self.verifier.verify_access(token) {
            Ok(principal) => GateOutcome::Verified(principal),
            Err(e) => GateOutcome::Rejected(GateRejection::Token(e)),
        }
    }
}

impl Stage for AuthenticationGate {
    fn name(&self) -> &'static str { "authentication" }

    fn run(&self, parts: &Parts, ctx: &mut RequestContext) -> Result<(), AppError> {
        match self.evaluate(&parts.method, parts.uri.path(), &parts.headers) {
            GateOutcome::Anonymous => Ok(()),
            GateOutcome::Verified(principal) => {
                ctx.principal = Some(principal);
                Ok(())
            }
            GateOutcome::Rejected(reason) => {
                let err = AppError::from(reason);
                warn!(target: "auth", method = %parts.method, path = %parts.uri.path(), reason = err.code_str(), "request rejected");
                Err(err)
            }
        }
    }
}

/// Reuses an inbound `x-request-id` or assigns a fresh one.
pub struct RequestIdStage;

impl Stage for RequestIdStage {
    fn name(&self) -> &'static str { "request-id" }

    fn run(&self, parts: &Parts, ctx: &mut RequestContext) -> Result<(), AppError> {
        let inbound = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= 128);
        ctx.request_id = Some(match inbound {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        });
        Ok(())
    }
}
