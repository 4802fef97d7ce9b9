use std::sync::Arc;

use socialhub::{app, config::ServerConfig, db, store::SqliteStore, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,socialhub=debug")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(?config, "starting socialhub v{}", env!("CARGO_PKG_VERSION"));

    let db_pool = db::connect(&config.database_url, config.db_max_connections).await?;
    let app_state = AppState::new(Arc::new(SqliteStore::new(db_pool))).with_heartbeat(config.heartbeat());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app(app_state, &config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received Ctrl+C, shutting down");
        })
        .await?;

    Ok(())
}
