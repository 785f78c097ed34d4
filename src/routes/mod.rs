//! Routers: the CRUD handler set per controller, plus common service routes.

pub mod common;
pub mod crud;
pub use common::{common_routes, common_routes_with_ready, openapi_routes};
pub use crud::crud_routes;
