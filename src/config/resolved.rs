//! Type-resolution namespace: generic parameter name -> bound type, fixed at controller build.

use crate::config::{ConcreteType, TypeBinding};
use crate::error::ConfigError;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct TypeNamespace {
    bindings: BTreeMap<String, TypeBinding>,
}

impl TypeNamespace {
    pub(crate) fn insert(&mut self, param: &str, binding: TypeBinding) {
        self.bindings.insert(param.to_string(), binding);
    }

    pub fn get(&self, param: &str) -> Option<&TypeBinding> {
        self.bindings.get(param)
    }

    /// Concrete type for `param`; a missing or placeholder entry is unresolved.
    pub fn resolve(&self, param: &str) -> Result<&ConcreteType, ConfigError> {
        self.bindings
            .get(param)
            .and_then(TypeBinding::as_concrete)
            .ok_or_else(|| ConfigError::UnresolvedModelType {
                param: param.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeBinding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
