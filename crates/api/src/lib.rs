//! HTTP API for CampaignBrain.
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness and uptime
//! - `POST /query` - Answer a business question
//! - `POST /workflow` - Run a prebuilt workflow (budget check, channel
//!   optimization, ROI analysis)
//! - `GET /history/{user_id}?limit=N&q=keyword` - Recent conversation turns
//! - `DELETE /history/{user_id}` - Forget a user's conversation
//! - `GET /stats/{user_id}` - Conversation statistics
//!
//! ```text
//! Client (chat UI, curl, ...)
//!    │
//!    ▼
//! ┌─────────────────┐
//! │   HTTP layer    │ ◄── This crate (auth, CORS, tracing)
//! │     (Axum)      │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  Orchestrator   │
//! └─────────────────┘
//! ```

pub mod auth;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use auth::ApiKeyConfig;
pub use state::AppState;

/// Permissive when no origins (or `*`) are given, otherwise restricted to
/// the listed origins.
fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let origins = match origins {
        Some(list) if !list.is_empty() && !list.iter().any(|o| o == "*") => list,
        _ => {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }
    };

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>, cors_origins: Option<Vec<String>>) -> Router {
    let mut router = Router::new()
        .route("/health", get(routes::health))
        .route("/query", post(routes::query))
        .route("/workflow", post(routes::run_workflow))
        .route(
            "/history/{user_id}",
            get(routes::get_history).delete(routes::clear_history),
        )
        .route("/stats/{user_id}", get(routes::get_stats));

    if let Some(api_key) = state.api_key.clone() {
        router = router.layer(middleware::from_fn_with_state(api_key, auth::require_api_key));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    cors_origins: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let router = create_router(state, cors_origins);

    info!(%addr, "Starting CampaignBrain API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
