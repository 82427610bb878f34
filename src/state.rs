//! Shared application state for all routes.

use crate::resource::ResourceModel;
use sqlx::PgPool;
use std::sync::Arc;

/// Resources are declared at startup and immutable for the process
/// lifetime, so a plain Arc suffices.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub model: Arc<ResourceModel>,
}
