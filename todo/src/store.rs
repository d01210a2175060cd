//! Request/response facade over the reducer store.
//!
//! Handlers need the outcome of their own command: the created item, the
//! new completion flag, or the reason it was rejected. [`TodoStore`] sends
//! the command and reads that outcome under the same write lock, then waits
//! for the command's effects (the snapshot write) before returning, so a
//! redirect never races the file.

use crate::error::TodoError;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{TodoAction, TodoId, TodoItem, TodoState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use todo_core::environment::Clock;
use todo_runtime::{EffectHandle, HealthCheck, Store, StoreError};

type Inner = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Consistent view of the list for rendering
#[derive(Debug, Clone, Serialize)]
pub struct TodoOverview {
    /// Items in creation order
    pub items: Vec<TodoItem>,
    /// Number of items
    pub total: usize,
    /// Number of completed items
    pub completed: usize,
}

/// The to-do list
///
/// Cheap to clone; clones share the same list.
#[derive(Clone)]
pub struct TodoStore {
    inner: Arc<Inner>,
}

impl TodoStore {
    /// Creates a store starting from `state`
    #[must_use]
    pub fn new(state: TodoState, env: TodoEnvironment) -> Self {
        Self {
            inner: Arc::new(Store::new(state, TodoReducer::new(), env)),
        }
    }

    /// Creates an empty, non-persistent store
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(TodoState::new(), TodoEnvironment::new(clock))
    }

    /// Adds a todo with the trimmed `title`.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Validation`] if the title is empty after trimming
    /// - [`TodoError::IdsExhausted`] if every id has been handed out
    /// - [`TodoError::Unavailable`] if the store is shutting down
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, title: &str) -> Result<TodoItem, TodoError> {
        let action = TodoAction::CreateTodo {
            title: title.to_string(),
        };
        self.dispatch(action, |state| {
            state
                .newest()
                .cloned()
                .ok_or_else(|| TodoError::Internal("created todo is missing".to_string()))
        })
        .await
    }

    /// Flips the completion flag of `id`, returning the updated item.
    ///
    /// # Errors
    ///
    /// - [`TodoError::NotFound`] if no todo has this id
    /// - [`TodoError::Unavailable`] if the store is shutting down
    #[tracing::instrument(skip(self))]
    pub async fn toggle(&self, id: TodoId) -> Result<TodoItem, TodoError> {
        self.dispatch(TodoAction::ToggleTodo { id }, |state| {
            state.get(id).cloned().ok_or(TodoError::NotFound(id))
        })
        .await
    }

    /// Removes `id` permanently.
    ///
    /// # Errors
    ///
    /// - [`TodoError::NotFound`] if no todo has this id, including one
    ///   already deleted
    /// - [`TodoError::Unavailable`] if the store is shutting down
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        self.dispatch(TodoAction::DeleteTodo { id }, |_| Ok(())).await
    }

    /// All todos in creation order
    pub async fn list(&self) -> Vec<TodoItem> {
        self.inner.state(TodoState::items).await
    }

    /// `(total, completed)` counts
    pub async fn counts(&self) -> (usize, usize) {
        self.inner
            .state(|state| (state.count(), state.completed_count()))
            .await
    }

    /// Items and counts taken from one read of the state
    pub async fn overview(&self) -> TodoOverview {
        self.inner
            .state(|state| TodoOverview {
                items: state.items(),
                total: state.count(),
                completed: state.completed_count(),
            })
            .await
    }

    /// Health of the store
    ///
    /// Unhealthy once shutdown starts. Degraded while the newest snapshot
    /// write has failed: the list still works but would not survive a
    /// restart.
    pub async fn health(&self) -> HealthCheck {
        let health = self.inner.health();
        if health.status.is_unhealthy() {
            return health;
        }

        let (saved_revision, failure) = self
            .inner
            .state(|state| (state.saved_revision, state.save_failure.clone()))
            .await;
        let health = match failure {
            Some(failure) => HealthCheck::degraded(
                "store",
                format!("Failed to save todo list: {}", failure.reason),
            )
            .with_metadata("failed_revision", failure.revision.to_string()),
            None => health,
        };
        health.with_metadata("saved_revision", saved_revision.to_string())
    }

    /// Stop accepting commands and wait for pending writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if writes are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.inner.shutdown(timeout).await
    }

    /// Send a command, read its outcome, and wait for its effects
    async fn dispatch<F, T>(&self, action: TodoAction, read: F) -> Result<T, TodoError>
    where
        F: FnOnce(&TodoState) -> Result<T, TodoError>,
    {
        let (outcome, handle) = self
            .inner
            .send_and_read(action, |state| match &state.last_error {
                Some(error) => Err(error.clone()),
                None => read(state),
            })
            .await?;
        Self::settle(handle).await;
        outcome
    }

    async fn settle(mut handle: EffectHandle) {
        handle.wait().await;
    }
}
