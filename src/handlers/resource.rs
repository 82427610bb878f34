//! Per-verb resource handlers: list, get, create, update, delete, options.
//!
//! Each handler resolves the resource from the path segment, acquires one
//! pooled connection for the whole request (released on every exit path by
//! drop), runs the built queries, and shapes the response per contract.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::filter::parse_filters;
use crate::response;
use crate::service::CrudService;
use crate::sql::{delete_by_id, insert, select_by_id, select_count, select_list, update as update_query, Page, Sort, SortDir};
use crate::state::AppState;

const PAGE_ARG: &str = "_page";
const PER_PAGE_ARG: &str = "_perPage";
const SORT_FIELD_ARG: &str = "_sortField";
const SORT_DIR_ARG: &str = "_sortDir";
const FILTERS_ARG: &str = "_filters";

/// List-endpoint inputs extracted from the query string. Any other query
/// keys are left alone.
#[derive(Debug, Default)]
pub struct ListParams {
    pub page: Option<Page>,
    pub sort: Option<Sort>,
    pub filters: Map<String, Value>,
}

impl ListParams {
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let page = match params.get(PAGE_ARG) {
            Some(raw) => {
                let page = parse_positive(raw, PAGE_ARG)?;
                let per_raw = params
                    .get(PER_PAGE_ARG)
                    .ok_or(AppError::MissingArgument(PER_PAGE_ARG))?;
                let per_page = parse_positive(per_raw, PER_PAGE_ARG)?;
                Some(Page { page, per_page })
            }
            None => None,
        };
        let sort = params.get(SORT_FIELD_ARG).map(|field| Sort {
            field: field.clone(),
            dir: match params.get(SORT_DIR_ARG).map(String::as_str) {
                Some("DESC") => SortDir::Desc,
                _ => SortDir::Asc,
            },
        });
        let filters = match params.get(FILTERS_ARG) {
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "{} must be a JSON object",
                        FILTERS_ARG
                    )))
                }
            },
            None => Map::new(),
        };
        Ok(ListParams { page, sort, filters })
    }
}

fn parse_positive(raw: &str, name: &'static str) -> Result<u32, AppError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// GET /:resource — filtered, paginated, sorted rows plus the total count.
/// The count is computed from the filters alone, before pagination and sort
/// touch the data query.
pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let Some(resource) = state.model.resource_by_path(&path_segment) else {
        return Ok(response::not_found());
    };
    let list_params = ListParams::from_query(&params)?;
    let predicates = parse_filters(resource, &list_params.filters)?;

    let mut conn = state.pool.acquire().await?;
    let total =
        CrudService::fetch_count(&mut conn, &select_count(resource, &predicates)).await?;
    let data_query = select_list(
        resource,
        &predicates,
        list_params.page.as_ref(),
        list_params.sort.as_ref(),
    );
    let rows = CrudService::fetch_all(&mut conn, &data_query).await?;
    response::json_list(&rows, total)
}

/// GET /:resource/:id — one row or an empty-bodied 404.
pub async fn get_one(
    State(state): State<AppState>,
    Path((path_segment, id_raw)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some(resource) = state.model.resource_by_path(&path_segment) else {
        return Ok(response::not_found());
    };
    let id = parse_id(&id_raw)?;
    let mut conn = state.pool.acquire().await?;
    match CrudService::fetch_optional(&mut conn, &select_by_id(resource, id)).await? {
        Some(row) => response::json(StatusCode::OK, &row),
        None => Ok(response::not_found()),
    }
}

/// POST /:resource — insert the body's declared-column keys; unknown keys
/// are dropped silently. Responds 201 with an empty body; the generated id
/// stays at the service layer.
pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Some(resource) = state.model.resource_by_path(&path_segment) else {
        return Ok(response::not_found());
    };
    let body = body_to_map(body)?;
    let mut conn = state.pool.acquire().await?;
    let id = CrudService::insert_returning_id(&mut conn, &insert(resource, &body)).await?;
    tracing::debug!(resource = %resource.path_segment, id, "created");
    Ok(response::empty(StatusCode::CREATED))
}

/// PUT /:resource/:id — partial update with the body's keys as-is (no
/// declared-column filtering, unlike create), then the freshly updated row.
pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_raw)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let Some(resource) = state.model.resource_by_path(&path_segment) else {
        return Ok(response::not_found());
    };
    let id = parse_id(&id_raw)?;
    let body = body_to_map(body)?;
    let mut conn = state.pool.acquire().await?;
    if CrudService::fetch_optional(&mut conn, &select_by_id(resource, id))
        .await?
        .is_none()
    {
        return Ok(response::not_found());
    }
    CrudService::execute(&mut conn, &update_query(resource, id, &body)).await?;
    // The update has been applied on this connection; read the row back.
    match CrudService::fetch_optional(&mut conn, &select_by_id(resource, id)).await? {
        Some(row) => response::json(StatusCode::OK, &row),
        None => Ok(response::not_found()),
    }
}

/// DELETE /:resource/:id — 204 on success, empty-bodied 404 if absent.
pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_raw)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some(resource) = state.model.resource_by_path(&path_segment) else {
        return Ok(response::not_found());
    };
    let id = parse_id(&id_raw)?;
    let mut conn = state.pool.acquire().await?;
    if CrudService::fetch_optional(&mut conn, &select_by_id(resource, id))
        .await?
        .is_none()
    {
        return Ok(response::not_found());
    }
    CrudService::execute(&mut conn, &delete_by_id(resource, id)).await?;
    Ok(response::empty(StatusCode::NO_CONTENT))
}

/// OPTIONS on any resource route: pre-flight negotiation only.
pub async fn preflight() -> Response {
    response::empty(StatusCode::OK)
}
