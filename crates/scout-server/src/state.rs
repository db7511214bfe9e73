use scout::gateway::Gateway;
use std::sync::Arc;

/// Shared application state. The gateway is built once at startup and is
/// read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}
