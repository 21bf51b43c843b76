use std::sync::Arc;

use crate::{auth::TokenKeys, config::AppConfig, db::SharedStore};

/// Shared by every handler. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub tokens: Arc<TokenKeys>,
    pub require_auth_for_writes: bool,
}

impl AppState {
    pub fn new(store: SharedStore, config: &AppConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenKeys::new(&config.jwt_secret, config.token_ttl)),
            require_auth_for_writes: config.require_auth_for_writes,
        }
    }
}
