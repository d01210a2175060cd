//! Application state for the to-do HTTP server.

use crate::store::TodoStore;
use crate::views::Views;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; both fields are shared handles.
#[derive(Clone)]
pub struct AppState {
    /// The to-do list
    pub todos: TodoStore,
    /// Compiled templates
    pub views: Arc<Views>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(todos: TodoStore, views: Arc<Views>) -> Self {
        Self { todos, views }
    }
}
