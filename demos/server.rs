//! Demo server: declares a couple of resources and mounts common and
//! resource routes.

use axum::Router;
use crudkit::{
    common_routes_with_ready, proxy_route, resource_routes, AppState, ProxyTarget, Resource,
    ResourceModel,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crudkit=debug")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/crudkit".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let model = ResourceModel::new(vec![
        Resource::new("users", "users")
            .column("name", "text")
            .column("signed_up_at", "timestamp"),
        Resource::new("tasks", "tasks")
            .column("name", "text")
            .column("tags", "text[]")
            .column("due_at", "timestamp")
            .column("estimate", "interval"),
    ]);
    let state = AppState {
        pool,
        model: Arc::new(model),
    };

    let mut app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", resource_routes(state));
    if let Ok(upstream) = std::env::var("UPSTREAM_USERS_URL") {
        app = app.merge(proxy_route("/api/v1/remote-users", ProxyTarget::new(upstream)));
    }

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
