//! # HTTP Server for the Review QR Wizard
//!
//! Serves the embedded frontend and a JSON API. Each browser tab gets its own
//! wizard session, kept in memory and dropped after 30 minutes of inactivity.
//!
//! ## Usage
//!
//! ```bash
//! GOOGLE_MAPS_API_KEY=... reviewqr serve --listen 0.0.0.0:8080
//! ```
//!
//! Then open http://localhost:8080 in a browser.

mod handlers;
mod state;
mod static_files;

pub use handlers::session::SessionSnapshot;
pub use state::{AppState, ServerConfig, SESSION_EXPIRATION_SECS};

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;

use crate::error::ReviewQrError;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Frontend
        .route("/", get(static_files::index_handler))
        .route("/assets/*path", get(static_files::asset_handler))
        // Templates
        .route("/api/templates", get(handlers::templates::list))
        // Wizard sessions
        .route("/api/session", post(handlers::session::create))
        .route("/api/session/:id", get(handlers::session::get))
        .route("/api/session/:id/input", post(handlers::session::input))
        .route("/api/session/:id/select", post(handlers::session::select))
        .route(
            "/api/session/:id/details/confirm-request",
            post(handlers::session::request_details_confirmation),
        )
        .route(
            "/api/session/:id/details/confirm",
            post(handlers::session::confirm_details),
        )
        .route(
            "/api/session/:id/details/edit",
            post(handlers::session::edit_details),
        )
        .route("/api/session/:id/captions", put(handlers::session::set_captions))
        .route(
            "/api/session/:id/template",
            put(handlers::session::select_template),
        )
        .route(
            "/api/session/:id/preview.png",
            get(handlers::session::preview),
        )
        .route(
            "/api/session/:id/download",
            post(handlers::session::request_download),
        )
        .route(
            "/api/session/:id/download/contact",
            put(handlers::session::set_contact),
        )
        .route(
            "/api/session/:id/download/cancel",
            post(handlers::session::cancel_download),
        )
        .route(
            "/api/session/:id/download/confirm",
            post(handlers::session::confirm_download),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use reviewqr::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), reviewqr::error::ReviewQrError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     api_key: std::env::var("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ReviewQrError> {
    if config.api_key.trim().is_empty() {
        tracing::warn!("no Maps API key configured; address search stays disabled");
    }

    let app_state = Arc::new(AppState::from_config(config.clone())?);

    // Spawn background session cleanup task
    tokio::spawn(cleanup_sessions(app_state.clone()));

    let app = router(app_state);

    tracing::info!(
        listen = %config.listen_addr,
        maps = %config.maps_base_url,
        "reviewqr HTTP server starting"
    );
    tracing::info!("Open http://{}/ in your browser", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            ReviewQrError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ReviewQrError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to drop expired sessions.
async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(SESSION_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let removed = purge_expired(&state, Instant::now(), expiration).await;
        if removed > 0 {
            tracing::info!(removed, "cleaned up expired sessions");
        }
    }
}

/// Remove sessions idle for at least `expiration`. Returns how many were removed.
///
/// A session whose lock is held is in use and always kept.
async fn purge_expired(state: &AppState, now: Instant, expiration: Duration) -> usize {
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, entry| match entry.try_lock() {
        Ok(entry) => now.duration_since(entry.last_accessed) < expiration,
        Err(_) => true,
    });
    before - sessions.len()
}
