/*
 * Responsibility
 * - bearer token の候補 (name, hash, scopes) を取得する interface
 * - DB ごとの scopes 保存形式 (text[] / JSON 文字列) を Vec<String> に正規化する
 *
 * Notes
 * - bcrypt hash は内容で検索できないため、SQL 実装は有効な全件を返す
 * - backend 障害は CredentialStoreError として上位に返す (認証失敗とは区別する)
 */
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::repos::{
    DbPool,
    bearer_token_repo::{self, StoredScopes},
    error::RepoError,
};

/// One registered client. Read-only from the auth path.
#[derive(Clone)]
pub struct BearerCredential {
    pub name: String,
    pub hash: String,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerCredential")
            .field("name", &self.name)
            .field("hash", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential backend unavailable")]
    Unavailable(#[from] RepoError),
}

#[derive(Debug, Error)]
pub enum ScopesError {
    #[error("scopes column is not a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoredScopes {
    /// Canonical ordered list, whichever store family produced it.
    pub fn normalize(self) -> Result<Vec<String>, ScopesError> {
        match self {
            StoredScopes::Array(scopes) => Ok(scopes),
            StoredScopes::Json(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            StoredScopes::Json(raw) => Ok(serde_json::from_str::<Vec<String>>(&raw)?),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Candidate credentials for a presented token. One read-only query per call.
    async fn candidates(&self, token: &str) -> Result<Vec<BearerCredential>, CredentialStoreError>;
}

/// SQL-backed store over either backing family.
#[derive(Clone, Debug)]
pub struct SqlCredentialStore {
    db: DbPool,
    table: String,
}

impl SqlCredentialStore {
    pub fn new(db: DbPool, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }
}

#[async_trait]
impl CredentialStore for SqlCredentialStore {
    async fn candidates(&self, _token: &str) -> Result<Vec<BearerCredential>, CredentialStoreError> {
        let rows = bearer_token_repo::list_active(&self.db, &self.table, Utc::now()).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match row.scopes.normalize() {
                Ok(scopes) => out.push(BearerCredential {
                    name: row.name,
                    hash: row.hash,
                    scopes,
                }),
                Err(err) => {
                    // A corrupt row must not lock every other client out.
                    tracing::warn!(id = %row.id, name = %row.name, error = %err, "skipping bearer token with unreadable scopes");
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory store that counts lookups and can simulate an outage.
    #[derive(Default)]
    pub struct StaticCredentialStore {
        pub credentials: Vec<BearerCredential>,
        pub fail: bool,
        calls: AtomicUsize,
    }

    impl StaticCredentialStore {
        pub fn new(credentials: Vec<BearerCredential>) -> Self {
            Self {
                credentials,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialStore for StaticCredentialStore {
        async fn candidates(
            &self,
            _token: &str,
        ) -> Result<Vec<BearerCredential>, CredentialStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RepoError::Db(sqlx::Error::Protocol(
                    "connection to server at 10.0.0.5 failed: password authentication failed"
                        .to_string(),
                ))
                .into());
            }
            Ok(self.credentials.clone())
        }
    }
}
