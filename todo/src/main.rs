//! To-do list HTTP server.

use std::sync::Arc;
use todo_app::{
    server::{build_router, AppState},
    Config, JsonFileStore, TodoEnvironment, TodoState, TodoStore, Views,
};
use todo_core::environment::SystemClock;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // Initialize tracing
    let level = &config.server.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("todo_app={level},tower_http={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting to-do server");
    info!(
        address = %config.bind_address(),
        data_file = ?config.storage.data_file,
        "Configuration loaded"
    );

    let mut env = TodoEnvironment::new(Arc::new(SystemClock));
    let mut initial = TodoState::new();

    if let Some(path) = &config.storage.data_file {
        let file = Arc::new(JsonFileStore::new(path));
        initial = TodoState::load_or_empty(&file);
        env = env.with_snapshots(file);
    }

    let todos = TodoStore::new(initial, env);
    let views = Arc::new(Views::new()?);
    let app = build_router(AppState::new(todos.clone(), views));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = todos.shutdown(config.shutdown_timeout()).await {
        warn!(error = %e, "Pending writes did not finish before shutdown");
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
