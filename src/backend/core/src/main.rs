//! Tessera Server - Main entry point

use std::sync::Arc;

use anyhow::Context;
use tessera_core::{
    acl::{AclDirectory, InMemoryAclDirectory},
    api::{self, AppState},
    auth::{AuthLayer, CredentialIssuer},
    config::Config,
    entities::{Author, Book},
    store::{InMemoryStore, RecordStore},
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    telemetry::init_logging(&config.logging)?;
    let metrics = telemetry::init_metrics(&config.metrics)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        auth = ?config.auth,
        "Starting Tessera Server"
    );

    let issuer = Arc::new(CredentialIssuer::new(&config.auth)?);
    let auth = AuthLayer::new(issuer.clone(), config.auth.public_paths.clone());

    let directory: Arc<dyn AclDirectory> = match config.auth.directory_file.as_deref() {
        Some(path) => Arc::new(
            InMemoryAclDirectory::load(path).context("Failed to load ACL directory")?,
        ),
        None => {
            tracing::warn!("No auth.directory_file configured, issued credentials carry empty ACLs");
            Arc::new(InMemoryAclDirectory::new())
        }
    };

    let books: Arc<dyn RecordStore<Book>> = Arc::new(InMemoryStore::<Book>::new());
    let authors: Arc<dyn RecordStore<Author>> = Arc::new(InMemoryStore::<Author>::new());
    let state = AppState::new(metrics, issuer, directory, books, authors);

    let app = api::build_router(state, auth);

    let addr = config.server.bind_address();
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
