//! Repository traits: per-request sessions over a model type, handed out by a provider.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Record identifier (`{id:int}` in paths).
pub type Id = i64;

/// Partial record used for updates; always carries the target id under [`ID_FIELD`].
pub type Patch = Map<String, Value>;

pub const ID_FIELD: &str = "id";

/// A type a generic controller can be bound to.
pub trait Model: Serialize + DeserializeOwned + ToSchema + Send + Sync + 'static {}

impl<T> Model for T where T: Serialize + DeserializeOwned + ToSchema + Send + Sync + 'static {}

/// Persistence session over `T`. Mutations with `commit = false` stay pending in the
/// session until [`Repository::commit`]; dropping the session discards them.
///
/// A write that fails (bad input, missing record, conflict) discards the session's whole
/// pending unit of work, including earlier uncommitted writes, and returns the error.
/// Failed reads leave pending writes alone.
#[async_trait]
pub trait Repository<T: Model>: Send + Sync {
    /// All records, in repository order.
    async fn list(&self) -> Result<Vec<T>, AppError>;

    async fn get(&self, id: Id) -> Result<T, AppError>;

    /// Insert `data`; an absent or null id is assigned by the repository.
    async fn add(&self, data: T, commit: bool) -> Result<T, AppError>;

    /// Merge `patch` into the record named by its id field.
    async fn update(&self, patch: Patch, commit: bool) -> Result<T, AppError>;

    async fn delete(&self, id: Id, commit: bool) -> Result<(), AppError>;

    async fn commit(&self) -> Result<(), AppError>;

    async fn rollback(&self) -> Result<(), AppError>;
}

/// Hands out one repository session per request.
#[async_trait]
pub trait RepositoryProvider<T: Model>: Send + Sync + 'static {
    type Repository: Repository<T> + 'static;

    async fn provide(&self) -> Result<Self::Repository, AppError>;
}

/// Id field of a serialized record: `Ok(None)` when absent or null.
pub fn record_id(record: &Map<String, Value>) -> Result<Option<Id>, AppError> {
    match record.get(ID_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("{} must be an integer", ID_FIELD))),
    }
}

/// Serialize a model into a JSON object.
pub(crate) fn to_record<T: Serialize>(data: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Validation("model must serialize to a JSON object".into())),
    }
}

/// Deserialize a stored record, reporting shape errors as validation failures.
pub(crate) fn from_record<T: DeserializeOwned>(record: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| AppError::Validation(e.to_string()))
}

/// Id a patch targets; patches without one are rejected.
pub(crate) fn patch_id(patch: &Patch) -> Result<Id, AppError> {
    record_id(patch)?.ok_or_else(|| AppError::Validation(format!("update requires '{}'", ID_FIELD)))
}

/// Overlay `patch` on `record`, key by key.
pub(crate) fn merge_patch(record: &mut Map<String, Value>, patch: Patch) {
    for (k, v) in patch {
        record.insert(k, v);
    }
}
