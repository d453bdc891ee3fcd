mod model;
mod service;
mod store;

pub use model::{CreateTodoRequest, Todo, TodoDetail, TodoListResponse, UpdateTodoRequest};
pub use service::TodoService;
pub use store::{InMemoryTodoStore, TodoStore};
