//!
//! todo service HTTP server
//! ------------------------
//! Axum router for account and todo endpoints. Every request passes the
//! pipeline middleware first; protected handlers read the verified principal
//! through the `Authenticated` extractor.
//!
//! Responsibilities:
//! - Sign-up, sign-in, refresh and contact checks under `/api/auth`.
//! - Tier promotion and per-account todo lists behind authentication.
//! - Startup wiring of config, stores, signer and verifier.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use tracing::info;

use crate::accounts::{AccountService, AccountStore, InMemoryAccountStore};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthorizationPolicy, Clock, Signer, SystemClock, Verifier};
use crate::todos::{InMemoryTodoStore, TodoService, TodoStore};

mod auth_api;
pub mod pipeline;
mod todo_api;

use pipeline::Pipeline;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub todos: Arc<TodoService>,
}

/// Unwrap a JSON body, answering malformed input with the uniform error shape.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload.map(|Json(v)| v).map_err(|e| AppError::user("invalid_input".to_string(), e.body_text()))
}

/// Wire services over the given stores and clock and return the full router.
pub fn build_app(
    config: &AppConfig,
    account_store: Arc<dyn AccountStore>,
    todo_store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Router> {
    let signer = Arc::new(Signer::new(&config.auth, clock.clone()).context("building token signer")?);
    let verifier = Arc::new(Verifier::new(&config.auth, clock.clone()).context("building token verifier")?);
    let pipeline = Arc::new(Pipeline::standard(AuthorizationPolicy::default(), verifier.clone()));
    let state = AppState {
        accounts: Arc::new(AccountService::new(account_store, signer, verifier, clock.clone())),
        todos: Arc::new(TodoService::new(todo_store, clock)),
    };
    Ok(router(state, pipeline))
}

pub fn router(state: AppState, pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(|| async { "todo service ok" }))
        .route("/health", get(|| async { Json(serde_json::json!({"status":"ok"})) }))
        .route("/api/auth/check", get(auth_api::check_email))
        .route("/api/auth/signup", post(auth_api::sign_up))
        .route("/api/auth/signin", post(auth_api::sign_in))
        .route("/api/auth/refresh", post(auth_api::refresh))
        .route("/api/users/promote", put(auth_api::promote))
        .route("/api/todos", get(todo_api::list).post(todo_api::create))
        .route("/api/todos/{id}", patch(todo_api::set_done).delete(todo_api::delete))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(pipeline, pipeline::handle))
}

/// Start the HTTP server with in-memory stores and the system clock.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let app = build_app(
        &config,
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryTodoStore::new()),
        Arc::new(SystemClock),
    )?;
    let addr: SocketAddr = format!("{}:{}", config.bind, config.http_port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind, config.http_port))?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
