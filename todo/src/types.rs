//! Domain types for the to-do list.
//!
//! A to-do list is a collection of items that can be created, toggled
//! between active and completed, and deleted. Ids come from a monotonic
//! counter and are never handed out twice, even after deletion. Once the
//! counter has passed `u64::MAX` no further todo can be created.

use crate::error::TodoError;
use crate::persistence::{JsonFileStore, TodoSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use todo_macros::Action;

/// Unique identifier for a todo item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// Creates a `TodoId` from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: TodoId,
    /// Title/description of the todo
    pub title: String,
    /// Whether the todo is completed
    pub completed: bool,
    /// When the todo was created
    pub created_at: DateTime<Utc>,
    /// When the todo was last marked completed (cleared when reopened)
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// Creates a new, active todo item
    #[must_use]
    pub const fn new(id: TodoId, title: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            completed: false,
            created_at,
            completed_at: None,
        }
    }

    /// Sets the completion flag, stamping or clearing `completed_at`
    pub const fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = if completed { Some(at) } else { None };
    }
}

/// State of the todo list
///
/// Items are keyed by id; since ids only grow, key order is creation order.
#[derive(Clone, Debug)]
pub struct TodoState {
    /// All todos indexed by ID
    pub todos: BTreeMap<TodoId, TodoItem>,
    /// Id the next created todo will receive; `None` once every id is used
    pub next_id: Option<u64>,
    /// Number of applied mutations, used to order snapshots
    pub revision: u64,
    /// Outcome of the most recent command, if it was rejected
    pub last_error: Option<TodoError>,
    /// Highest revision known to be in snapshot storage
    pub saved_revision: u64,
    /// Newest snapshot write that failed, until a later one succeeds
    pub save_failure: Option<SaveFailure>,
}

/// A snapshot write that did not reach storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveFailure {
    /// Revision the snapshot was taken at
    pub revision: u64,
    /// Storage error, as text
    pub reason: String,
}

impl Default for TodoState {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            todos: BTreeMap::new(),
            next_id: Some(1),
            revision: 0,
            last_error: None,
            saved_revision: 0,
            save_failure: None,
        }
    }

    /// Rebuilds state from a persisted snapshot
    ///
    /// The id counter is moved past every stored id, so a hand-edited file
    /// cannot cause an id to be reused.
    #[must_use]
    pub fn from_snapshot(snapshot: TodoSnapshot) -> Self {
        let todos: BTreeMap<TodoId, TodoItem> = snapshot
            .items
            .into_iter()
            .map(|item| (item.id, item))
            .collect();
        let after_last = match todos.keys().next_back() {
            Some(last) => last.get().checked_add(1),
            None => Some(1),
        };
        let next_id = snapshot
            .next_id
            .zip(after_last)
            .map(|(stored, after)| stored.max(after));

        Self {
            todos,
            next_id,
            revision: snapshot.revision,
            last_error: None,
            saved_revision: snapshot.revision,
            save_failure: None,
        }
    }

    /// Loads the list kept in `file`, falling back to an empty one
    ///
    /// A missing or blank file is a fresh list. An unreadable or corrupt
    /// file is logged as a warning and also yields an empty list; the file
    /// itself is left alone until the first mutation overwrites it.
    #[must_use]
    pub fn load_or_empty(file: &JsonFileStore) -> Self {
        let path = file.path().display();
        match file.load() {
            Ok(Some(snapshot)) => {
                tracing::info!(%path, items = snapshot.items.len(), "Loaded todo list");
                Self::from_snapshot(snapshot)
            },
            Ok(None) => {
                tracing::info!(%path, "No stored todos, starting with an empty list");
                Self::new()
            },
            Err(error) => {
                tracing::warn!(
                    %path,
                    %error,
                    "Stored todos are unreadable, starting with an empty list"
                );
                Self::new()
            },
        }
    }

    /// Captures the persistable part of the state
    #[must_use]
    pub fn snapshot(&self) -> TodoSnapshot {
        TodoSnapshot {
            revision: self.revision,
            next_id: self.next_id,
            items: self.items(),
        }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.values().filter(|t| t.completed).count()
    }

    /// Returns all todos in creation order
    #[must_use]
    pub fn items(&self) -> Vec<TodoItem> {
        self.todos.values().cloned().collect()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.todos.get(&id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: TodoId) -> bool {
        self.todos.contains_key(&id)
    }

    /// Returns the most recently created todo still present
    #[must_use]
    pub fn newest(&self) -> Option<&TodoItem> {
        self.todos.values().next_back()
    }
}

/// Actions representing commands and events for todos
///
/// Commands express intent and are validated by the reducer. Events record
/// what happened and are the only actions that change state.
#[derive(Action, Clone, Debug)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Create a new todo
    #[command]
    CreateTodo {
        /// Title as submitted (trimmed by the reducer)
        title: String,
    },

    /// Command: Flip a todo between active and completed
    #[command]
    ToggleTodo {
        /// Todo to toggle
        id: TodoId,
    },

    /// Command: Delete a todo
    #[command]
    DeleteTodo {
        /// Todo to delete
        id: TodoId,
    },

    // ========== Events ==========
    /// Event: Todo was created
    #[event]
    TodoCreated {
        /// Todo identifier
        id: TodoId,
        /// Title of the todo
        title: String,
        /// When the todo was created
        created_at: DateTime<Utc>,
    },

    /// Event: Todo completion flag changed
    #[event]
    TodoToggled {
        /// Todo identifier
        id: TodoId,
        /// New value of the flag
        completed: bool,
        /// When the change happened
        toggled_at: DateTime<Utc>,
    },

    /// Event: Todo was deleted
    #[event]
    TodoDeleted {
        /// Todo identifier
        id: TodoId,
    },

    /// Event: A command was rejected
    #[event]
    CommandRejected {
        /// Why the command was rejected
        error: TodoError,
    },

    /// Event: A snapshot reached storage
    #[event]
    SnapshotSaved {
        /// Revision the snapshot was taken at
        revision: u64,
    },

    /// Event: A snapshot could not be written
    #[event]
    SnapshotFailed {
        /// Revision the snapshot was taken at
        revision: u64,
        /// Storage error, as text
        reason: String,
    },
}
