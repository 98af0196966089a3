use std::sync::Arc;

use crate::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backing document store. Built once at startup and shared by every request.
    pub store: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }
}
