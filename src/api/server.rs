//! HTTP API server

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthService, MemoryTokenStorage};
use crate::config::Config;
use crate::error::Result;
use crate::store::postgres::PgStore;

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub auth: Arc<AuthService>,
}

pub type SharedState = Arc<AppState>;

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let store = Arc::new(PgStore::connect(&config.database).await?);
    store.init_schema().await?;

    // The server validates bearer tokens per request; the single persisted
    // client token has no meaning here, so it stays in memory.
    let auth = Arc::new(AuthService::new(
        store.clone(),
        store,
        Arc::new(MemoryTokenStorage::new()),
        &config.auth,
    ));

    let state = Arc::new(AppState { auth });
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Admin API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(routes::current_account))
        .route("/api/auth/password", post(routes::change_password))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let admin_only = Router::new()
        .route("/api/accounts", post(routes::create_account))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/auth/login", post(routes::login))
        // Logout stays unguarded so revoking a dead token still succeeds
        .route("/api/auth/logout", post(routes::logout))
        .merge(protected)
        .merge(admin_only)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
