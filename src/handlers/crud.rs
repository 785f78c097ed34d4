//! Generic CRUD handlers: list, read, create, update, delete.
//! Each one asks the provider for a repository session and forwards to it; repository errors
//! pass through unchanged.

use crate::error::AppError;
use crate::params::HandlerParams;
use crate::response::{empty, reply};
use crate::service::{Id, Model, Patch, Repository, RepositoryProvider, ID_FIELD};
use crate::state::CrudState;
use axum::{
    extract::{Path, State},
    http::Method,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

/// Optional window over the repository's list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl ListParams {
    pub fn apply<T>(&self, records: Vec<T>) -> Vec<T> {
        records
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

fn body_to_map(value: Value) -> Result<Patch, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

pub async fn list<T, P>(
    State(state): State<CrudState<T, P>>,
    HandlerParams(page): HandlerParams<ListParams>,
) -> Result<Response, AppError>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let ctl = state.controller.controller();
    tracing::debug!(path = %ctl.path(), limit = ?page.limit, offset = ?page.offset, "list");
    let repository = state.controller.provider().provide().await?;
    let records = page.apply(repository.list().await?);
    let status = ctl.config().status_override(&Method::GET);
    Ok(reply(&Method::GET, status, ctl.to_wire(&records)?))
}

pub async fn read<T, P>(
    State(state): State<CrudState<T, P>>,
    Path(id): Path<Id>,
) -> Result<Response, AppError>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let ctl = state.controller.controller();
    tracing::debug!(path = %ctl.path(), id, "get");
    let repository = state.controller.provider().provide().await?;
    let record = repository.get(id).await?;
    let status = ctl.config().status_override(&Method::GET);
    Ok(reply(&Method::GET, status, ctl.to_wire(&record)?))
}

pub async fn create<T, P>(
    State(state): State<CrudState<T, P>>,
    Json(body): Json<Value>,
) -> Result<Response, AppError>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let ctl = state.controller.controller();
    let body = ctl.config().dto.inbound(body_to_map(body)?);
    let data: T = serde_json::from_value(Value::Object(body)).map_err(|e| AppError::Validation(e.to_string()))?;
    tracing::debug!(path = %ctl.path(), "create");
    let repository = state.controller.provider().provide().await?;
    let created = repository.add(data, true).await?;
    let status = ctl.config().status_override(&Method::POST);
    Ok(reply(&Method::POST, status, ctl.to_wire(&created)?))
}

/// The path id is written into the patch after the body fields, so it wins over a body id.
pub async fn update<T, P>(
    State(state): State<CrudState<T, P>>,
    Path(id): Path<Id>,
    Json(body): Json<Value>,
) -> Result<Response, AppError>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let ctl = state.controller.controller();
    let mut patch = ctl.config().dto.inbound(body_to_map(body)?);
    if let Some(body_id) = patch.get(ID_FIELD).and_then(Value::as_i64).filter(|b| *b != id) {
        tracing::debug!(path = %ctl.path(), id, body_id, "body id ignored in favour of path id");
    }
    patch.insert(ID_FIELD.to_string(), Value::from(id));
    tracing::debug!(path = %ctl.path(), id, "update");
    let repository = state.controller.provider().provide().await?;
    let updated = repository.update(patch, true).await?;
    let status = ctl.config().status_override(&Method::PUT);
    Ok(reply(&Method::PUT, status, ctl.to_wire(&updated)?))
}

pub async fn delete<T, P>(
    State(state): State<CrudState<T, P>>,
    Path(id): Path<Id>,
) -> Result<Response, AppError>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let ctl = state.controller.controller();
    tracing::debug!(path = %ctl.path(), id, "delete");
    let repository = state.controller.provider().provide().await?;
    repository.delete(id, true).await?;
    let status = ctl.config().status_override(&Method::DELETE);
    Ok(empty(&Method::DELETE, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_window() {
        let all: Vec<i32> = (1..=5).collect();
        assert_eq!(ListParams::default().apply(all.clone()), all);
        let page = ListParams { limit: Some(2), offset: Some(1) };
        assert_eq!(page.apply(all.clone()), vec![2, 3]);
        let past_end = ListParams { limit: None, offset: Some(9) };
        assert!(past_end.apply(all).is_empty());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(matches!(body_to_map(serde_json::json!([1])), Err(AppError::BadRequest(_))));
        assert!(body_to_map(serde_json::json!({"a": 1})).is_ok());
    }
}
