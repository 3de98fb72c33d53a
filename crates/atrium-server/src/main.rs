//! Atrium server entry point.
//!
//! Bootstraps the secret store backend and the configuration engine, then
//! starts the Axum HTTP server with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use atrium_core::audit::FileAuditSink;
use atrium_core::probe::ConnectionTester;
use atrium_core::{ConfigEngine, Registry};
use atrium_storage::{EncryptedFileStore, MemoryStore, SecretStore, StoreKey};

use atrium_server::config::{ServerConfig, StorageBackendType};
use atrium_server::routes;
use atrium_server::state::AppState;

use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?storage_kind(&config.storage_backend), "Atrium starting");

    let state = build_app_state(&config).await?;
    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Atrium admin API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Atrium server stopped");
    Ok(())
}

fn storage_kind(backend: &StorageBackendType) -> &'static str {
    match backend {
        StorageBackendType::Memory => "memory",
        StorageBackendType::EncryptedFile { .. } => "encrypted-file",
    }
}

/// Build the shared application state.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let backend: Arc<dyn SecretStore> = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory secret store (data will not persist)");
            Arc::new(MemoryStore::new())
        }
        StorageBackendType::EncryptedFile { path, key_hex } => {
            let key = StoreKey::from_hex(key_hex).context("invalid ATRIUM_STORAGE_KEY")?;
            if let Some(parent) = std::path::Path::new(path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create '{}'", parent.display()))?;
            }
            info!(path = %path, "using encrypted file secret store");
            Arc::new(
                EncryptedFileStore::open(path, key)
                    .await
                    .context("failed to open encrypted secret store")?,
            )
        }
    };

    let engine = Arc::new(ConfigEngine::new(
        Arc::new(Registry::builtin()),
        backend,
        ConnectionTester::with_network(config.probe_timeout),
    ));

    if let Some(ref audit_path) = config.audit_file_path {
        engine
            .add_audit_sink(Arc::new(FileAuditSink::new(audit_path)))
            .await;
        info!(path = %audit_path, "reveal audit file registered");
    }

    Ok(Arc::new(AppState { engine }))
}

/// Build the Axum router with all routes and middleware.
fn build_router(state: Arc<AppState>) -> Router {
    // CORS — the admin dashboard dev server runs on another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    // Bound concurrent config operations — reveals and probes are
    // security-sensitive and probe-bound respectively.
    let config_routes = Router::new()
        .nest("/v1/config", routes::config::router())
        .layer(tower::limit::ConcurrencyLimitLayer::new(16));

    Router::new()
        .merge(config_routes)
        .nest("/v1/sys", routes::sys::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        // Responses can carry revealed secrets — never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
