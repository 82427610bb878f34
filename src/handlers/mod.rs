//! HTTP handlers: resource CRUD plus the upstream pass-through.

pub mod proxy;
pub mod resource;

pub use proxy::{relay, ProxyTarget};
pub use resource::*;
