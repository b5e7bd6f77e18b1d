use std::sync::Arc;

use tl_core::StatusService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StatusService>,
}

impl AppState {
    pub fn new(service: Arc<StatusService>) -> Self {
        Self { service }
    }
}
