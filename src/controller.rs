//! Generic controllers: a validated declaration bound to a model type, and the CRUD handler
//! set built on top of it.

use crate::config::{
    normalize_path, validate, ConcreteType, ControllerConfig, TypeBinding, TypeNamespace, MODEL_PARAM,
    REPOSITORY_PARAM,
};
use crate::error::{AppError, ConfigError};
use crate::service::{Model, RepositoryProvider};
use axum::Router;
use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::marker::PhantomData;

/// A controller declaration bound to model type `T`.
///
/// Building one validates the config and records `"T"` (and `"R"` when a repository type is
/// declared) in the controller's [`TypeNamespace`]. A placeholder model type is accepted here;
/// it is rejected only when the controller is routed.
pub struct GenericController<T> {
    config: ControllerConfig,
    namespace: TypeNamespace,
    _model: PhantomData<fn() -> T>,
}

impl<T: Model> GenericController<T> {
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        validate(&config)?;
        let model = config.model_type.clone().ok_or_else(|| ConfigError::MissingModelType {
            controller: config.path.clone(),
        })?;
        if let TypeBinding::Concrete(concrete) = &model {
            if concrete.type_id != TypeId::of::<T>() {
                return Err(ConfigError::ModelTypeMismatch {
                    expected: type_name::<T>(),
                    found: concrete.rust_type,
                });
            }
        }

        let mut namespace = TypeNamespace::default();
        namespace.insert(MODEL_PARAM, model);
        if let Some(repository) = &config.repository_type {
            namespace.insert(REPOSITORY_PARAM, repository.clone());
        }
        tracing::info!(
            path = %config.path,
            model = namespace.get(MODEL_PARAM).map(TypeBinding::display_name).unwrap_or_default(),
            "generic controller bound"
        );
        Ok(GenericController {
            config,
            namespace,
            _model: PhantomData,
        })
    }

    pub fn namespace(&self) -> &TypeNamespace {
        &self.namespace
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Path prefix without a trailing slash ("" for the root).
    pub fn path(&self) -> String {
        normalize_path(&self.config.path)
    }

    /// The concrete model binding; fails while the model type is still a placeholder.
    pub fn model_type(&self) -> Result<&ConcreteType, ConfigError> {
        self.namespace.resolve(MODEL_PARAM)
    }

    /// Serialize a record (or records) and apply outbound field renames.
    pub fn to_wire<V: Serialize>(&self, value: &V) -> Result<Value, AppError> {
        Ok(self.config.dto.outbound(serde_json::to_value(value)?))
    }
}

/// List/get/create/update/delete handlers over `T`, delegating to repositories from `P`.
pub struct GenericCrudController<T, P> {
    controller: GenericController<T>,
    provider: P,
}

impl<T, P> GenericCrudController<T, P>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    /// Build from a declaration. When no repository type is declared, the provider's
    /// repository type is recorded.
    pub fn new(config: ControllerConfig, provider: P) -> Result<Self, ConfigError> {
        let config = if config.repository_type.is_some() {
            config
        } else {
            config.repository_type::<P::Repository>()
        };
        Ok(GenericCrudController {
            controller: GenericController::new(config)?,
            provider,
        })
    }

    pub fn controller(&self) -> &GenericController<T> {
        &self.controller
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mount the five handlers under the controller path. Fails if the model type is unbound.
    pub fn router(self) -> Result<Router, ConfigError> {
        crate::routes::crud_routes(self)
    }

    /// OpenAPI document for this controller's routes, with `T` resolved from the namespace.
    pub fn openapi(&self) -> Result<utoipa::openapi::OpenApi, ConfigError> {
        crate::openapi::crud_openapi(&self.controller)
    }
}
