//! Axum router configuration with middleware.
//!
//! All routes except `/health` are under `/api/v1/` and require an API key.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Catalog
        .route("/templates", get(handlers::template::list_templates))
        .route("/template-groups", get(handlers::template::list_groups))
        // Cloning
        .route("/maas/duplicate", post(handlers::maas::duplicate))
        .route("/maas/mass-copy", post(handlers::maas::mass_copy))
        .route("/maas/synchronize", post(handlers::maas::synchronize))
        // Workflows and lineage
        .route("/workflows", get(handlers::lineage::list_workflows))
        .route("/workflows/{id}", get(handlers::lineage::get_workflow))
        .route("/workflows/{id}/ancestor", get(handlers::lineage::ancestor))
        .route("/workflows/{id}/diverged", post(handlers::lineage::mark_diverged))
        .route(
            "/origins/{origin_id}/descendants",
            get(handlers::lineage::descendants),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus a database check (no auth required).
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let db_healthy = sqlx::query("SELECT 1")
        .execute(&state.db_pool.reader)
        .await
        .is_ok();
    axum::Json(serde_json::json!({
        "status": if db_healthy { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "db_healthy": db_healthy,
    }))
}
