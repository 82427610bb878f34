//! Query execution services.

mod crud;
pub use crud::CrudService;
