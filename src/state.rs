//! Router state shared by the CRUD handlers of one controller.

use crate::controller::GenericCrudController;
use std::sync::Arc;

pub struct CrudState<T, P> {
    pub controller: Arc<GenericCrudController<T, P>>,
}

impl<T, P> Clone for CrudState<T, P> {
    fn clone(&self) -> Self {
        CrudState {
            controller: Arc::clone(&self.controller),
        }
    }
}

impl<T, P> CrudState<T, P> {
    pub fn new(controller: GenericCrudController<T, P>) -> Self {
        CrudState {
            controller: Arc::new(controller),
        }
    }
}
