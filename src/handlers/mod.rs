//! HTTP handlers for the generic CRUD handler set.

pub mod crud;
pub use crud::*;
