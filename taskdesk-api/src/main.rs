//! # TaskDesk API Server
//!
//! HTTP server for the TaskDesk assignment tracker.
//!
//! ## Architecture
//!
//! Built with Axum on a Postgres pool:
//! - User endpoints (register, login, self-service, admin role management)
//! - Task endpoints (admin CRUD with PDF attachments, self-scoped listing)
//! - JWT bearer authentication with an admin gate on management routes
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskdesk-api
//! ```

use std::sync::Arc;

use taskdesk_api::{app, config::Config};
use taskdesk_shared::{
    db::{migrations::run_migrations, pool::create_pool},
    storage::object_store::HttpObjectStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(config.database.clone()).await?;
    run_migrations(&pool).await?;

    let store = Arc::new(HttpObjectStore::new(config.storage.clone())?);
    let addr = config.bind_address();
    let state = app::AppState::new(pool.clone(), store, config);

    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
