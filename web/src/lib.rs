//! Axum integration for the to-do service.
//!
//! This crate is the imperative shell around the reducer core: it turns HTTP
//! requests into store calls and store outcomes into responses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, forms, cookies
//! │  - Request parsing                      │  ← Flash messages
//! │  - Response rendering                   │  ← Logging
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Pure business logic (reducers)       │  ← Testable at memory speed
//! │  - State transformations                │  ← No I/O, no side effects
//! │  - Effect descriptions (values)         │  ← Composable, inspectable
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from request (form fields, path, flash cookie)
//! 3. **Dispatch** a command through the store
//! 4. **Record outcome** as a flash message
//! 5. **Redirect** to the list view, which renders and drains the messages

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod flash;
pub mod handlers;

// Re-export key types for convenience
pub use error::AppError;
pub use flash::{Flash, FlashLevel, FlashMessage, FLASH_COOKIE};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
