//! Response construction: JSON bodies with an explicit charset, list
//! responses carrying the total item count.

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::AppError;

/// Every response declares its charset, JSON or empty alike.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Total item count for list responses, computed independent of pagination.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// JSON body response with the given status.
pub fn json(status: StatusCode, value: &Value) -> Result<Response, AppError> {
    let body = serde_json::to_string(value)?;
    Ok((status, [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)], body).into_response())
}

/// List response: 200, JSON array body, `X-Total-Count` header.
pub fn json_list(rows: &[Value], total: i64) -> Result<Response, AppError> {
    let body = serde_json::to_string(rows)?;
    let mut resp =
        (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)], body).into_response();
    resp.headers_mut().insert(
        HeaderName::from_static(TOTAL_COUNT_HEADER),
        HeaderValue::from(total),
    );
    Ok(resp)
}

/// Status-only response with an empty body.
pub fn empty(status: StatusCode) -> Response {
    (status, [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)]).into_response()
}

/// 404 with an empty body: absence of a row is part of the endpoint
/// contract, not an error.
pub fn not_found() -> Response {
    empty(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_response_carries_total_count() {
        let resp = json_list(&[json!({"id": 1})], 42).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(TOTAL_COUNT_HEADER).map(|v| v.to_str().unwrap()),
            Some("42")
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap()),
            Some(CONTENT_TYPE_JSON)
        );
    }

    #[test]
    fn not_found_is_empty() {
        let resp = not_found();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
