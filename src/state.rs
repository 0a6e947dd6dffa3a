/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db pool, 設定済みテーブル名, bearer auth (無効なら None), admin 認証情報
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - 起動時に一度組み立て、以降は読み取り専用
 */
use std::sync::Arc;

use crate::config::{AdminCredentials, Config, Tables};
use crate::repos::DbPool;
use crate::services::auth::{BearerAuth, build_bearer_auth};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: DbPool,
    pub tables: Arc<Tables>,
    pub bearer: Option<Arc<BearerAuth>>,
    pub admin: Option<Arc<AdminCredentials>>,
}

impl AppState {
    pub fn new(config: &Config, db: DbPool) -> Self {
        let bearer = build_bearer_auth(config, &db);
        Self {
            tables: Arc::new(config.database.tables.clone()),
            admin: config.admin.clone().map(Arc::new),
            bearer,
            db,
        }
    }

    pub fn bearer_auth_enabled(&self) -> bool {
        self.bearer.is_some()
    }
}
