use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::{body, AppState};
use crate::error::AppResult;
use crate::identity::Authenticated;
use crate::todos::{CreateTodoRequest, TodoListResponse, UpdateTodoRequest};

pub(crate) async fn list(State(state): State<AppState>, Authenticated(p): Authenticated) -> AppResult<Json<TodoListResponse>> {
    Ok(Json(state.todos.list(&p)?))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(p): Authenticated,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> AppResult<Json<TodoListResponse>> {
    let req = body(payload)?;
    Ok(Json(state.todos.create(&p, &req.title)?))
}

pub(crate) async fn set_done(
    State(state): State<AppState>,
    Authenticated(p): Authenticated,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> AppResult<Json<TodoListResponse>> {
    let req = body(payload)?;
    Ok(Json(state.todos.set_done(&p, &id, req.done)?))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(p): Authenticated,
    Path(id): Path<String>,
) -> AppResult<Json<TodoListResponse>> {
    Ok(Json(state.todos.delete(&p, &id)?))
}
