//! HTTP API for the tournament server.
//!
//! # Modules
//!
//! - [`tournaments`]: Tournament lifecycle handlers
//! - [`actor`]: Caller extraction from request headers
//! - [`error`]: Error code to HTTP status mapping
//! - [`request_id`]: Request ID propagation and request metrics
//!
//! # Endpoints Overview
//!
//! ## Tournaments
//! - `POST /api/v1/tournaments` - Create tournament (staff)
//! - `GET  /api/v1/tournaments/{id}` - Get tournament
//! - `POST /api/v1/tournaments/{id}/teams` - Register team (founder or coach)
//! - `GET  /api/v1/tournaments/{id}/teams` - List registered teams
//! - `POST /api/v1/tournaments/{id}/structure` - Generate bracket or schedule (staff)
//! - `GET  /api/v1/tournaments/{id}/bracket` - List bracket matches
//! - `POST /api/v1/tournaments/{id}/bracket/{match_id}/result` - Report bracket result (staff)
//! - `GET  /api/v1/tournaments/{id}/schedule` - List round-robin schedule
//! - `POST /api/v1/tournaments/{id}/schedule/{match_id}/result` - Report round-robin result (staff)
//! - `GET  /api/v1/tournaments/{id}/standings` - List standings
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tourney::{MemoryStore, TournamentManager};
//! use tourney_server::api::{AppState, create_router};
//! use tourney_server::config::StoreBackend;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = TournamentManager::new(Arc::new(MemoryStore::new()));
//! let state = AppState {
//!     manager: Arc::new(manager),
//!     backend: StoreBackend::Memory,
//!     postgres: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod actor;
pub mod error;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tourney::{PgDocumentStore, TournamentManager};
use tower_http::cors::CorsLayer;

use crate::config::StoreBackend;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the manager sits behind an `Arc`.
///
/// # Fields
///
/// - `manager`: Entry point for every tournament operation
/// - `backend`: Store backend the manager runs against
/// - `postgres`: Handle used by the health check when the backend is postgres
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    pub backend: StoreBackend,
    pub postgres: Option<PgDocumentStore>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                                             - Health check
/// POST /api/v1/tournaments                                 - Create tournament
/// GET  /api/v1/tournaments/{id}                            - Get tournament
/// POST /api/v1/tournaments/{id}/teams                      - Register team
/// GET  /api/v1/tournaments/{id}/teams                      - List teams
/// POST /api/v1/tournaments/{id}/structure                  - Generate structure
/// GET  /api/v1/tournaments/{id}/bracket                    - List bracket
/// POST /api/v1/tournaments/{id}/bracket/{match_id}/result  - Report bracket result
/// GET  /api/v1/tournaments/{id}/schedule                   - List schedule
/// POST /api/v1/tournaments/{id}/schedule/{match_id}/result - Report round-robin result
/// GET  /api/v1/tournaments/{id}/standings                  - List standings
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{tournament_id}",
            get(tournaments::get_tournament),
        )
        .route(
            "/tournaments/{tournament_id}/teams",
            get(tournaments::list_teams).post(tournaments::register_team),
        )
        .route(
            "/tournaments/{tournament_id}/structure",
            post(tournaments::generate_structure),
        )
        .route(
            "/tournaments/{tournament_id}/bracket",
            get(tournaments::list_bracket),
        )
        .route(
            "/tournaments/{tournament_id}/bracket/{match_id}/result",
            post(tournaments::report_bracket_result),
        )
        .route(
            "/tournaments/{tournament_id}/schedule",
            get(tournaments::list_schedule),
        )
        .route(
            "/tournaments/{tournament_id}/schedule/{match_id}/result",
            post(tournaments::report_round_robin_result),
        )
        .route(
            "/tournaments/{tournament_id}/standings",
            get(tournaments::list_standings),
        )
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store is reachable, or `503 Service Unavailable`
/// when the postgres connection fails.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"1.0.0","backend":"memory","store":true,"timestamp":"2026-10-18T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match &state.postgres {
        Some(store) => match store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store health check failed");
                false
            }
        },
        None => true,
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend.to_string(),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
