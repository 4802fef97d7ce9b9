pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod relay;
pub mod session;
pub mod store;

mod appresult;

use std::sync::Arc;

use axum::{extract::FromRef, routing::get, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppJson, AppResult};

use config::ServerConfig;
use relay::{ConnectionRegistry, Heartbeat, Relay};
use store::Store;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let relay = Relay::new(ConnectionRegistry::new(), store.clone());
        Self { store, relay }
    }

    pub fn with_heartbeat(self, heartbeat: Heartbeat) -> Self {
        Self { relay: self.relay.with_heartbeat(heartbeat), ..self }
    }
}

pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session_idle_minutes)));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ws", get(relay::relay_ws))

        .merge(auth::router())
        .nest("/api", api::router())

        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
