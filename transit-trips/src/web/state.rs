//! Application state for the web layer.

use std::sync::Arc;

use crate::provider::Provider;

/// Shared application state.
pub struct AppState<P> {
    /// Backend integration serving every request
    pub provider: Arc<P>,
}

impl<P: Provider> AppState<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

// Not derived: a derive would require `P: Clone`.
impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}
