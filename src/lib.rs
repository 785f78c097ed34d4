//! Architect CRUD: generic controllers for axum. A controller declaration binds a model type,
//! and the CRUD handler set forwards list/get/create/update/delete to an injected repository.

pub mod config;
pub mod controller;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod params;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{ControllerConfig, ServerSettings, TypeBinding, TypeNamespace, MODEL_PARAM, REPOSITORY_PARAM};
pub use controller::{GenericController, GenericCrudController};
pub use dto::{DtoConfig, RenameStrategy};
pub use error::{AppError, ConfigError};
pub use params::{parse_headers, parse_query_params, HandlerHeaders, HandlerParams, ParamValue};
pub use response::{default_status_code, status_for};
pub use routes::{common_routes, common_routes_with_ready, crud_routes, openapi_routes};
pub use service::{Id, InMemoryRepository, InMemoryStore, Model, Patch, PgRepository, PgStore, Repository, RepositoryProvider};
pub use state::CrudState;
pub use store::{connect, ensure_database_exists, ensure_model_table};
