//! GET pass-through to a fixed upstream URL.
//!
//! The incoming query string is re-encoded onto the upstream request and the
//! upstream body is relayed verbatim. A failed fetch or a non-success
//! upstream status surfaces as an upstream error.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::response::CONTENT_TYPE_JSON;

/// Upstream target for a proxied route. One client per target, shared
/// across requests.
#[derive(Clone, Debug)]
pub struct ProxyTarget {
    url: String,
    client: reqwest::Client,
}

impl ProxyTarget {
    pub fn new(url: impl Into<String>) -> Self {
        ProxyTarget {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// GET on a proxied route: fetch the target with the request's query
/// parameters and relay the body.
pub async fn relay(
    State(target): State<ProxyTarget>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let upstream = target
        .client
        .get(target.url())
        .query(&params)
        .send()
        .await?
        .error_for_status()?;
    let body = upstream.bytes().await?;
    tracing::debug!(url = %target.url(), bytes = body.len(), "relayed upstream body");
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)], body).into_response())
}
