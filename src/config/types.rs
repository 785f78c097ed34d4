//! Controller declaration: path prefix, model/repository type bindings and DTO rules.

use crate::dto::DtoConfig;
use axum::http::{Method, StatusCode};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use utoipa::openapi::{RefOr, Schema};
use utoipa::ToSchema;

/// Generic parameter name the model type is registered under.
pub const MODEL_PARAM: &str = "T";
/// Generic parameter name the repository type is registered under.
pub const REPOSITORY_PARAM: &str = "R";

/// Default request body cap (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// A concrete Rust type recorded for a generic parameter.
#[derive(Clone)]
pub struct ConcreteType {
    /// Name used in schema documents (component key).
    pub schema_name: String,
    pub rust_type: &'static str,
    pub type_id: TypeId,
    /// Present for model types; repositories carry no schema.
    pub schema: Option<RefOr<Schema>>,
}

impl fmt::Debug for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteType")
            .field("schema_name", &self.schema_name)
            .field("rust_type", &self.rust_type)
            .field("has_schema", &self.schema.is_some())
            .finish_non_exhaustive()
    }
}

/// What a generic parameter resolves to.
#[derive(Clone, Debug)]
pub enum TypeBinding {
    /// Unbound generic parameter, to be fixed by a derived declaration.
    Placeholder(String),
    Concrete(ConcreteType),
}

impl TypeBinding {
    /// Binding for a model type, capturing its schema for later document generation.
    pub fn model<M: ToSchema + 'static>() -> Self {
        TypeBinding::Concrete(ConcreteType {
            schema_name: M::name().into_owned(),
            rust_type: type_name::<M>(),
            type_id: TypeId::of::<M>(),
            schema: Some(M::schema()),
        })
    }

    /// Binding for a type that has no schema (e.g. a repository).
    pub fn opaque<R: 'static>() -> Self {
        let rust_type = type_name::<R>();
        TypeBinding::Concrete(ConcreteType {
            schema_name: short_type_name(rust_type).to_string(),
            rust_type,
            type_id: TypeId::of::<R>(),
            schema: None,
        })
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, TypeBinding::Concrete(_))
    }

    pub fn as_concrete(&self) -> Option<&ConcreteType> {
        match self {
            TypeBinding::Concrete(c) => Some(c),
            TypeBinding::Placeholder(_) => None,
        }
    }

    /// Rust type name, or the placeholder name when unbound.
    pub fn display_name(&self) -> &str {
        match self {
            TypeBinding::Concrete(c) => c.rust_type,
            TypeBinding::Placeholder(p) => p,
        }
    }
}

/// Last path segment of a type name, generics stripped: `a::b::Repo<x::Y>` -> `Repo`.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Declaration of a generic controller. Validated by [`crate::config::validate`]
/// when the controller is built; a value, so derived controllers clone and rebind it.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Path prefix the handlers are mounted under ("" or "/..." ).
    pub path: String,
    pub model_type: Option<TypeBinding>,
    pub repository_type: Option<TypeBinding>,
    pub dto: DtoConfig,
    pub body_limit: usize,
    /// Response status per verb, replacing the 201/204/200 defaults.
    pub status_codes: HashMap<Method, StatusCode>,
}

impl ControllerConfig {
    pub fn new(path: impl Into<String>) -> Self {
        ControllerConfig {
            path: path.into(),
            model_type: None,
            repository_type: None,
            dto: DtoConfig::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            status_codes: HashMap::new(),
        }
    }

    /// Bind the model type to a concrete type. Replaces any earlier binding.
    pub fn model_type<M: ToSchema + 'static>(mut self) -> Self {
        self.model_type = Some(TypeBinding::model::<M>());
        self
    }

    /// Declare the model type as an unbound generic parameter.
    pub fn generic_model(mut self, param: impl Into<String>) -> Self {
        self.model_type = Some(TypeBinding::Placeholder(param.into()));
        self
    }

    pub fn repository_type<R: 'static>(mut self) -> Self {
        self.repository_type = Some(TypeBinding::opaque::<R>());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn dto(mut self, dto: DtoConfig) -> Self {
        self.dto = dto;
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Answer `method` requests with `status` instead of the per-verb default.
    pub fn status_code(mut self, method: Method, status: StatusCode) -> Self {
        self.status_codes.insert(method, status);
        self
    }

    pub fn status_override(&self, method: &Method) -> Option<StatusCode> {
        self.status_codes.get(method).copied()
    }
}
