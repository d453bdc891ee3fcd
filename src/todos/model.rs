use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTodoRequest {
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoDetail {
    pub id: String,
    pub title: String,
    pub done: bool,
}

impl From<&Todo> for TodoDetail {
    fn from(t: &Todo) -> Self {
        Self { id: t.id.clone(), title: t.title.clone(), done: t.done }
    }
}

/// Every todo mutation answers with the caller's full list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoListResponse {
    pub todos: Vec<TodoDetail>,
}

impl TodoListResponse {
    pub fn from_todos(todos: &[Todo]) -> Self {
        Self { todos: todos.iter().map(TodoDetail::from).collect() }
    }
}
