use anyhow::Result;
use parking_lot::RwLock;

use super::model::Todo;

/// Todo persistence collaborator.
pub trait TodoStore: Send + Sync {
    /// Insert unless the owner already holds `cap` todos. Count and insert are
    /// one atomic step. Returns false when the cap blocked the insert.
    fn insert_capped(&self, todo: Todo, cap: Option<usize>) -> Result<bool>;
    /// Owner's todos in creation order.
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Todo>>;
    fn find(&self, id: &str) -> Result<Option<Todo>>;
    /// Replace an existing todo; false if the id is unknown.
    fn update(&self, todo: Todo) -> Result<bool>;
    fn delete(&self, id: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct InMemoryTodoStore {
    // insertion order is creation order
    rows: RwLock<Vec<Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self { Self::default() }
}

impl TodoStore for InMemoryTodoStore {
    fn insert_capped(&self, todo: Todo, cap: Option<usize>) -> Result<bool> {
        let mut rows = self.rows.write();
        if let Some(cap) = cap {
            let held = rows.iter().filter(|t| t.owner_id == todo.owner_id).count();
            if held >= cap {
                return Ok(false);
            }
        }
        rows.push(todo);
        Ok(true)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Todo>> {
        Ok(self.rows.read().iter().filter(|t| t.owner_id == owner_id).cloned().collect())
    }

    fn find(&self, id: &str) -> Result<Option<Todo>> {
        Ok(self.rows.read().iter().find(|t| t.id == id).cloned())
    }

    fn update(&self, todo: Todo) -> Result<bool> {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|t| t.id == todo.id) {
            Some(slot) => {
                *slot = todo;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|t| t.id != id);
        Ok(rows.len() != before)
    }
}
