use std::sync::Arc;

use tracing::{debug, info};

use super::model::{Todo, TodoListResponse};
use super::store::TodoStore;
use crate::error::{ServiceError, ServiceResult};
use crate::identity::{Clock, Principal};

/// Per-account task lists. The quota comes from the principal's tier alone;
/// the account store is never read here.
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn create(&self, principal: &Principal, title: &str) -> ServiceResult<TodoListResponse> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("title must not be blank".into()));
        }
        let quota = principal.tier.todo_quota();
        let todo = Todo {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            done: false,
            owner_id: principal.subject_id.clone(),
            created_at: chrono::DateTime::from_timestamp(self.clock.now(), 0).unwrap_or_else(chrono::Utc::now),
        };
        let id = todo.id.clone();
        if !self.store.insert_capped(todo, quota)? {
            info!(target: "todos", owner = %principal.subject_id, tier = %principal.tier, "todo quota reached");
            return Err(ServiceError::QuotaExceeded { limit: quota.unwrap_or_default() });
        }
        debug!(target: "todos", owner = %principal.subject_id, id = %id, "todo created");
        self.list(principal)
    }

    pub fn list(&self, principal: &Principal) -> ServiceResult<TodoListResponse> {
        let todos = self.store.list_by_owner(&principal.subject_id)?;
        Ok(TodoListResponse::from_todos(&todos))
    }

    pub fn set_done(&self, principal: &Principal, id: &str, done: bool) -> ServiceResult<TodoListResponse> {
        let mut todo = self.owned(principal, id)?;
        todo.done = done;
        if !self.store.update(todo)? {
            return Err(ServiceError::TodoNotFound);
        }
        self.list(principal)
    }

    pub fn delete(&self, principal: &Principal, id: &str) -> ServiceResult<TodoListResponse> {
        self.owned(principal, id)?;
        if !self.store.delete(id)? {
            return Err(ServiceError::TodoNotFound);
        }
        debug!(target: "todos", owner = %principal.subject_id, id = %id, "todo deleted");
        self.list(principal)
    }

    // foreign todos look exactly like missing ones
    fn owned(&self, principal: &Principal, id: &str) -> ServiceResult<Todo> {
        match self.store.find(id)? {
            Some(t) if t.owner_id == principal.subject_id => Ok(t),
            _ => Err(ServiceError::TodoNotFound),
        }
    }
}
