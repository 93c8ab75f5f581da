// Application state module
// Immutable runtime state shared across connections

use super::types::Config;

/// Application state, created once at startup and shared behind `Arc`.
/// The configuration is read-only for the process lifetime; requests
/// never mutate shared state.
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}
