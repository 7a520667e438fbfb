use std::sync::Arc;

use crate::config::Config;
use crate::provider::ContentProvider;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Chosen once at startup from `Config::provider`.
    pub provider: Arc<dyn ContentProvider>,
    pub config: Config,
}
