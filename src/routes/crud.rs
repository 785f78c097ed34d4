//! CRUD routes for one controller: collection path for list/create, `/:id` for get/update/delete.

use crate::config::MODEL_PARAM;
use crate::controller::GenericCrudController;
use crate::error::ConfigError;
use crate::handlers::crud::{create, delete as delete_handler, list, read, update};
use crate::service::{Model, RepositoryProvider};
use crate::state::CrudState;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn crud_routes<T, P>(controller: GenericCrudController<T, P>) -> Result<Router, ConfigError>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let ctl = controller.controller();
    let model = ctl.namespace().resolve(MODEL_PARAM)?;
    let base = ctl.path();
    let collection = if base.is_empty() { "/".to_string() } else { base.clone() };
    let detail = format!("{}/:id", base);
    let body_limit = ctl.config().body_limit;
    tracing::info!(collection = %collection, detail = %detail, model = %model.rust_type, "crud routes mounted");

    let state = CrudState::new(controller);
    Ok(Router::new()
        .route(&collection, get(list::<T, P>).post(create::<T, P>))
        .route(
            &detail,
            get(read::<T, P>).put(update::<T, P>).delete(delete_handler::<T, P>),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state))
}
