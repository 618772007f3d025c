//! Application state shared across all request handlers.

use arcd_core::service::GameService;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Command processor in front of the event registry.
    pub service: GameService,
}

impl AppState {
    pub fn new(service: GameService) -> Self {
        Self { service }
    }
}
