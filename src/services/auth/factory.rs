/// Factory: build `BearerAuth` from application `Config`.
///
/// Returns `None` when bearer-token auth is switched off for this deployment;
/// the router then mounts the protected routes without the middleware.
use std::sync::Arc;

use crate::config::Config;
use crate::repos::DbPool;
use crate::services::auth::{BearerAuth, SqlCredentialStore};

pub fn build_bearer_auth(config: &Config, db: &DbPool) -> Option<Arc<BearerAuth>> {
    if !config.bearer_token_auth_enabled {
        tracing::warn!("bearer token auth is disabled; protected routes are open");
        return None;
    }

    let store = SqlCredentialStore::new(db.clone(), config.database.tables.bearer_token.clone());
    Some(Arc::new(BearerAuth::new(Arc::new(store))))
}
