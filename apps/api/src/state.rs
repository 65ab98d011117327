use crate::config::Config;

/// Shared application state injected into route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}
