//! Router configuration for the to-do service.

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use todo_web::handlers::health_check;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// | Method | Path                  | Handler                  |
/// |--------|-----------------------|--------------------------|
/// | GET    | `/`                   | list page                |
/// | POST   | `/add`                | create from form `title` |
/// | POST   | `/complete/:todo_id`  | toggle completion        |
/// | POST   | `/delete/:todo_id`    | delete                   |
/// | GET    | `/static/style.css`   | stylesheet               |
/// | GET    | `/health`             | liveness                 |
/// | GET    | `/ready`              | store readiness          |
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/add", post(handlers::add_todo))
        .route("/complete/:todo_id", post(handlers::toggle_todo))
        .route("/delete/:todo_id", post(handlers::delete_todo))
        .route("/static/style.css", get(handlers::stylesheet))
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(handlers::readiness))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
