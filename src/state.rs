use crate::config::Config;
use crate::services::access::AuthorizationChecker;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Explicitly constructed application context, passed to every component
/// at startup instead of global singletons.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub authz: Arc<dyn AuthorizationChecker>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn AuthorizationChecker> {
    fn from_ref(state: &AppState) -> Self {
        state.authz.clone()
    }
}
