//! Routers: resource CRUD plus common service routes.
//!
//! Resource routes are parameterized on the path segment; handlers resolve
//! the declared resource per request.

use crate::handlers::{create, delete, get_one, list, preflight, relay, update, ProxyTarget};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/:resource",
            get(list).post(create).options(preflight),
        )
        .route(
            "/:resource/:id",
            get(get_one).put(update).delete(delete).options(preflight),
        )
        .with_state(state)
}

/// GET pass-through route: requests on `path` fetch the target with the
/// query string re-encoded and relay its body.
pub fn proxy_route(path: &str, target: ProxyTarget) -> Router {
    Router::new().route(path, get(relay).with_state(target))
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready(State(state): State<AppState>) -> Result<Json<HealthBody>, StatusCode> {
    if sqlx::query("SELECT 1").fetch_optional(&state.pool).await.is_err() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(HealthBody { status: "ok" }))
}

/// GET /health and /version, no state required.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}

/// Common routes including readiness with a database check.
pub fn common_routes_with_ready(state: AppState) -> Router {
    common_routes()
        .route("/ready", get(ready).with_state(state))
}
