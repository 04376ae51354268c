//! HTTP layer - axum router, extractors and route handlers
//!
//! Handlers are thin: they authenticate, call into [`crate::core`] and
//! serialize the result. Every failure is an [`crate::errors::Error`] turned
//! into a JSON response by [`error`].

/// Identity extraction from the upstream auth proxy
pub mod auth;
/// `Error` to HTTP response mapping
pub mod error;
/// Route handlers grouped by resource
pub mod handlers;
mod routes;

use crate::{
    ai::SummaryGenerator,
    config::settings::AppConfig,
    core::summary::SummaryContext,
    errors::{Error, Result},
    mail::MailTransport,
};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::{future::Future, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all operations
    pub db: DatabaseConnection,
    /// AI dispatcher, also owns the key cipher
    pub generator: Arc<SummaryGenerator>,
    /// Outbound mail
    pub mailer: Arc<dyn MailTransport>,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Bundles the pieces the summary pipeline needs.
    #[must_use]
    pub fn summary_context(&self) -> SummaryContext<'_> {
        SummaryContext {
            db: &self.db,
            generator: &self.generator,
            persist_fallbacks: self.config.ai.persist_fallbacks,
        }
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!("Ignoring invalid CORS origin {:?}: {}", origin, e))
                .ok()
        })
        .collect();
    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", routes::api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn serve<F>(state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_addr = state.config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| Error::Config {
            message: format!("Failed to bind {bind_addr}: {e}"),
        })?;
    info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
