//! crudkit: REST-to-SQL adapter library.
//!
//! Declare a table once and a route once; the resource gets list, get,
//! create, update and delete endpoints with filtering, pagination, sorting
//! and tagged-JSON temporal values.

pub mod codec;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use error::AppError;
pub use handlers::ProxyTarget;
pub use resource::{ColumnInfo, Resource, ResourceModel, PK_COLUMN};
pub use routes::{common_routes, common_routes_with_ready, proxy_route, resource_routes};
pub use service::CrudService;
pub use state::AppState;
