//! Request handlers.
//!
//! Mutating handlers never fail on expected outcomes: an empty title or an
//! unknown id becomes a flash message and the browser is sent back to the
//! list with `303 See Other`. Only a path segment that is not a number or an
//! unavailable store produces an error response.

use super::state::AppState;
use crate::error::TodoError;
use crate::types::TodoId;
use crate::views::{IndexPage, STYLESHEET};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect},
    Form, Json,
};
use serde::Deserialize;
use todo_runtime::HealthCheck;
use todo_web::{handlers::readiness_response, AppError, Flash, WebResult};

/// Form body of `POST /add`
#[derive(Debug, Deserialize)]
pub struct AddTodoForm {
    /// Submitted title; a missing field counts as empty
    #[serde(default)]
    pub title: String,
}

/// `GET /`: render the list and consume pending flash messages.
///
/// # Errors
///
/// Returns a 500 error if the page cannot be rendered.
pub async fn index(
    State(state): State<AppState>,
    mut flash: Flash,
) -> WebResult<(Flash, Html<String>)> {
    let overview = state.todos.overview().await;
    tracing::info!(
        total = overview.total,
        completed = overview.completed,
        "Rendering index page"
    );

    let messages = flash.take_messages();
    let page = IndexPage {
        todos: &overview.items,
        total: overview.total,
        completed: overview.completed,
        messages: &messages,
    };
    let html = state
        .views
        .render_index(&page)
        .map_err(|e| AppError::internal("Failed to render page").with_source(e.into()))?;

    Ok((flash, Html(html)))
}

/// `POST /add`: create a todo from the form's `title`.
///
/// # Errors
///
/// Returns a 503 error if the store is shutting down.
pub async fn add_todo(
    State(state): State<AppState>,
    flash: Flash,
    Form(form): Form<AddTodoForm>,
) -> WebResult<(Flash, Redirect)> {
    let flash = match state.todos.add(&form.title).await {
        Ok(todo) => {
            tracing::info!(id = %todo.id, title = %todo.title, "Added new todo");
            flash.success("Todo added successfully!")
        },
        Err(TodoError::Validation(reason)) => {
            tracing::warn!(%reason, "Attempted to add an empty todo title");
            flash.warning("Please enter a todo title!")
        },
        Err(TodoError::IdsExhausted) => {
            tracing::error!("Todo ids are exhausted, nothing more can be added");
            flash.error("No more todos can be added.")
        },
        Err(e) => return Err(store_failure(e)),
    };
    Ok((flash, Redirect::to("/")))
}

/// `POST /complete/:todo_id`: flip a todo between active and completed.
///
/// # Errors
///
/// Returns 404 if `todo_id` is not a number and 503 if the store is
/// shutting down.
pub async fn toggle_todo(
    State(state): State<AppState>,
    flash: Flash,
    Path(todo_id): Path<String>,
) -> WebResult<(Flash, Redirect)> {
    let Some(id) = parse_todo_id(&todo_id)? else {
        tracing::warn!(%todo_id, "Attempted to toggle non-existent todo");
        return Ok((flash.error("Todo not found."), Redirect::to("/")));
    };
    let flash = match state.todos.toggle(id).await {
        Ok(todo) => {
            tracing::info!(%id, completed = todo.completed, "Toggled completion for todo");
            flash.info("Todo status updated!")
        },
        Err(TodoError::NotFound(_)) => {
            tracing::warn!(%id, "Attempted to toggle non-existent todo");
            flash.error("Todo not found.")
        },
        Err(e) => return Err(store_failure(e)),
    };
    Ok((flash, Redirect::to("/")))
}

/// `POST /delete/:todo_id`: remove a todo.
///
/// # Errors
///
/// Returns 404 if `todo_id` is not a number and 503 if the store is
/// shutting down.
pub async fn delete_todo(
    State(state): State<AppState>,
    flash: Flash,
    Path(todo_id): Path<String>,
) -> WebResult<(Flash, Redirect)> {
    let Some(id) = parse_todo_id(&todo_id)? else {
        tracing::warn!(%todo_id, "Attempted to delete non-existent todo");
        return Ok((flash.error("Todo to delete was not found."), Redirect::to("/")));
    };
    let flash = match state.todos.delete(id).await {
        Ok(()) => {
            tracing::info!(%id, "Deleted todo");
            flash.success("Todo deleted successfully!")
        },
        Err(TodoError::NotFound(_)) => {
            tracing::warn!(%id, "Attempted to delete non-existent todo");
            flash.error("Todo to delete was not found.")
        },
        Err(e) => return Err(store_failure(e)),
    };
    Ok((flash, Redirect::to("/")))
}

/// `GET /static/style.css`
#[allow(clippy::unused_async)]
pub async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLESHEET,
    )
}

/// `GET /ready`: 200 while the store accepts commands (reporting
/// `Degraded` if saving fails), 503 after shutdown starts.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthCheck>) {
    readiness_response(state.todos.health().await)
}

/// Reads a `:todo_id` path segment.
///
/// Only plain decimal digits route to a todo. A number too large to be an
/// id names no todo and yields `Ok(None)`.
fn parse_todo_id(raw: &str) -> Result<Option<TodoId>, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::not_found("Todo", raw));
    }
    Ok(raw.parse().ok().map(TodoId::new))
}

fn store_failure(error: TodoError) -> AppError {
    match error {
        TodoError::Unavailable(message) => AppError::unavailable(message),
        other => AppError::internal("Unexpected store outcome").with_source(other.into()),
    }
}
