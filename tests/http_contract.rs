//! Status and body contracts at the router level.
//!
//! Requests are driven through the router with `oneshot`. The pool is built
//! lazily, so every case here resolves before a connection would be needed;
//! row-level contracts (201/204, per-row 404) are exercised in the opt-in
//! test at the bottom against a live database.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use crudkit::{resource_routes, AppState, Resource, ResourceModel};
use tower::ServiceExt;

fn app() -> Router {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/never_connected")
        .unwrap();
    let model = ResourceModel::new(vec![Resource::new("users", "users").column("name", "text")]);
    resource_routes(AppState {
        pool,
        model: Arc::new(model),
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
}

#[tokio::test]
async fn unknown_resource_is_404_with_empty_body() {
    for uri in ["/widgets", "/widgets/1"] {
        let resp = app().oneshot(get(uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "uri {}", uri);
        assert!(body_bytes(resp).await.is_empty(), "uri {}", uri);
    }
}

#[tokio::test]
async fn options_answers_200_with_empty_body() {
    for uri in ["/users", "/users/1"] {
        let req = Request::builder()
            .method("OPTIONS")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "uri {}", uri);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap()),
            Some("application/json; charset=utf-8"),
            "uri {}",
            uri
        );
        assert!(body_bytes(resp).await.is_empty(), "uri {}", uri);
    }
}

#[tokio::test]
async fn non_integer_id_is_400() {
    let resp = app().oneshot(get("/users/forty-two")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(body.contains("bad_request"), "{}", body);
}

#[tokio::test]
async fn page_without_per_page_is_400() {
    let resp = app().oneshot(get("/users?_page=2")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(body.contains("missing_argument"), "{}", body);
}

#[tokio::test]
async fn create_rejects_non_object_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("[1,2]"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// Row-level contracts need a live database.
#[tokio::test]
#[ignore = "needs PostgreSQL; set DATABASE_URL and run with --ignored"]
async fn row_lifecycle_status_contracts() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&url)
        .await
        .unwrap();
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS contract_users (id BIGSERIAL PRIMARY KEY, name TEXT)",
    )
    .execute(&pool)
    .await
    .unwrap();
    let model = ResourceModel::new(vec![
        Resource::new("users", "contract_users").column("name", "text"),
    ]);
    let app = resource_routes(AppState {
        pool: pool.clone(),
        model: Arc::new(model),
    });

    // Creation answers 201 with an empty body; unknown keys are dropped.
    let req = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"contract","bogus":1}"#))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(body_bytes(resp).await.is_empty());

    let (id,): (i64,) = sqlx::query_as("SELECT MAX(id) FROM contract_users")
        .fetch_one(&pool)
        .await
        .unwrap();

    // An absent row is 404 with an empty body, for read and delete alike.
    for req in [
        get(&format!("/users/{}", id + 100_000)),
        Request::builder()
            .method("DELETE")
            .uri(format!("/users/{}", id + 100_000))
            .body(Body::empty())
            .unwrap(),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(resp).await.is_empty());
    }

    // Deleting the created row answers 204; it is then gone.
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/users/{}", id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app.clone().oneshot(get(&format!("/users/{}", id))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
