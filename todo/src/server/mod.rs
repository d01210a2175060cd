//! HTTP server module for the to-do service.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Form handlers for the list
//! - Router configuration

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
