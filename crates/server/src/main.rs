use db::DBService;
use server::{
    AppState,
    config::{Config, ConfigError},
    file_logging, routes,
};
use services::services::blob_store::{BlobBackend, BlobError};
use sqlx::Error as SqlxError;
use thiserror::Error;
use utils::assets::ensure_asset_dir;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}

#[tokio::main]
async fn main() -> Result<(), KanbanError> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    let asset_dir = ensure_asset_dir()?;
    let config = Config::from_env(&asset_dir)?;

    // The guard must be held for the lifetime of the application to ensure logs are flushed
    let _file_log_guard = file_logging::init_logging(&config.log_level, &config.file_logging);

    let db = DBService::new(&config.database_url).await?;
    let backend = BlobBackend::from_connection_string(config.blob_storage_url.as_deref()).await?;
    let state = AppState::new(db.clone(), backend);

    let app_router = routes::router(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{}:{actual_port}", config.host);

    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    perform_cleanup_actions(&db).await;

    Ok(())
}

pub async fn shutdown_signal() {
    // Always wait for Ctrl+C
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                // Fallback: never resolves
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}

pub async fn perform_cleanup_actions(db: &DBService) {
    // Fold the WAL back into the main database file before exit
    tracing::info!("Running final WAL checkpoint...");
    match sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(&db.pool)
        .await
    {
        Ok(_) => tracing::info!("Final WAL checkpoint completed"),
        Err(e) => tracing::warn!("Final WAL checkpoint failed: {}", e),
    }

    tracing::info!("Closing database connection pool...");
    db.pool.close().await;
    tracing::info!("Database connection pool closed");
}
