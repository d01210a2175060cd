//! A server-rendered to-do list.
//!
//! The list lives in a reducer-driven store: commands (`CreateTodo`,
//! `ToggleTodo`, `DeleteTodo`) are validated by [`TodoReducer`], turned into
//! events, and applied under a single write lock. [`TodoStore`] wraps the
//! store with request/response operations for the HTTP handlers, and
//! [`persistence`] optionally keeps the list in a JSON file.
//!
//! # Quick Start
//!
//! ```no_run
//! use todo_app::TodoStore;
//! use todo_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), todo_app::TodoError> {
//! let todos = TodoStore::in_memory(Arc::new(SystemClock));
//!
//! let milk = todos.add("Buy milk").await?;
//! todos.toggle(milk.id).await?;
//!
//! let (total, completed) = todos.counts().await;
//! assert_eq!((total, completed), (1, 1));
//!
//! todos.delete(milk.id).await?;
//! assert!(todos.list().await.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod persistence;
pub mod reducer;
pub mod server;
pub mod store;
pub mod types;
pub mod views;

pub use config::Config;
pub use error::TodoError;
pub use persistence::{JsonFileStore, PersistenceError, SnapshotStore, TodoSnapshot};
pub use reducer::{TodoEnvironment, TodoReducer};
pub use store::{TodoOverview, TodoStore};
pub use types::{SaveFailure, TodoAction, TodoId, TodoItem, TodoState};
pub use views::Views;
