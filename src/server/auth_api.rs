use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{body, AppState};
use crate::accounts::{LoginResponse, RefreshRequest, RefreshResponse, SignInRequest, SignUpRequest, SignUpResponse};
use crate::error::{AppError, AppResult};
use crate::identity::Authenticated;

#[derive(Debug, Deserialize)]
pub(crate) struct CheckQuery {
    #[serde(default)]
    email: String,
}

pub(crate) async fn check_email(State(state): State<AppState>, Query(q): Query<CheckQuery>) -> AppResult<Json<bool>> {
    Ok(Json(state.accounts.is_contact_taken(&q.email)?))
}

// Argon2 work runs off the async workers.
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> crate::error::ServiceResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!("account task failed: {e}");
            AppError::internal("internal_error", "internal server error")
        })?
        .map_err(AppError::from)
}

pub(crate) async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> AppResult<Json<SignUpResponse>> {
    let req = body(payload)?;
    let accounts = state.accounts.clone();
    Ok(Json(blocking(move || accounts.sign_up(req)).await?))
}

pub(crate) async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let req = body(payload)?;
    let accounts = state.accounts.clone();
    Ok(Json(blocking(move || accounts.sign_in(req)).await?))
}

pub(crate) async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<RefreshResponse>> {
    let req = body(payload)?;
    Ok(Json(state.accounts.refresh(&req.refresh_token)?))
}

pub(crate) async fn promote(State(state): State<AppState>, Authenticated(principal): Authenticated) -> AppResult<Json<LoginResponse>> {
    Ok(Json(state.accounts.promote(&principal)?))
}
