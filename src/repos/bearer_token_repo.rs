/*
 * Responsibility
 * - bearer token テーブル向け SQLx 操作 (admin CRUD + 認証用の有効 token 一覧)
 * - scopes の保存形式は DB ごとに異なる (PostgreSQL: text[] / MySQL: JSON 文字列)
 *   ここでは StoredScopes に包んで返すだけで、解釈は上位 (services::auth) が行う
 *
 * Assumed columns: id (varchar 36), name, hash, scopes, expires (nullable), created
 */
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::repos::{DbPool, error::RepoResult};

/// Scopes as they come off the wire, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredScopes {
    Array(Vec<String>),
    Json(String),
}

#[derive(Debug, Clone)]
pub struct BearerTokenRow {
    pub id: String,
    pub name: String,
    pub hash: String,
    pub scopes: StoredScopes,
    pub expires: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PgBearerTokenRow {
    id: String,
    name: String,
    hash: String,
    scopes: Vec<String>,
    expires: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct MySqlBearerTokenRow {
    id: String,
    name: String,
    hash: String,
    scopes: String,
    expires: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
}

impl From<PgBearerTokenRow> for BearerTokenRow {
    fn from(r: PgBearerTokenRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            hash: r.hash,
            scopes: StoredScopes::Array(r.scopes),
            expires: r.expires,
            created: r.created,
        }
    }
}

impl From<MySqlBearerTokenRow> for BearerTokenRow {
    fn from(r: MySqlBearerTokenRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            hash: r.hash,
            scopes: StoredScopes::Json(r.scopes),
            expires: r.expires,
            created: r.created,
        }
    }
}

pub struct NewBearerToken<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub hash: &'a str,
    pub scopes: &'a [String],
    pub expires: Option<DateTime<Utc>>,
}

/// Tokens that have not expired at `now`.
pub async fn list_active(
    db: &DbPool,
    table: &str,
    now: DateTime<Utc>,
) -> RepoResult<Vec<BearerTokenRow>> {
    let rows = match db {
        DbPool::Postgres(pool) => {
            let sql = format!(
                "SELECT id, name, hash, scopes, expires, created FROM {table} \
                 WHERE expires IS NULL OR expires > $1"
            );
            sqlx::query_as::<_, PgBearerTokenRow>(&sql)
                .bind(now)
                .fetch_all(pool)
                .await?
                .into_iter()
                .map(BearerTokenRow::from)
                .collect()
        }
        DbPool::MySql(pool) => {
            let sql = format!(
                "SELECT id, name, hash, scopes, expires, created FROM {table} \
                 WHERE expires IS NULL OR expires > ?"
            );
            sqlx::query_as::<_, MySqlBearerTokenRow>(&sql)
                .bind(now)
                .fetch_all(pool)
                .await?
                .into_iter()
                .map(BearerTokenRow::from)
                .collect()
        }
    };

    Ok(rows)
}

pub async fn list(db: &DbPool, table: &str) -> RepoResult<Vec<BearerTokenRow>> {
    let sql = format!(
        "SELECT id, name, hash, scopes, expires, created FROM {table} ORDER BY created DESC"
    );

    let rows = match db {
        DbPool::Postgres(pool) => sqlx::query_as::<_, PgBearerTokenRow>(&sql)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(BearerTokenRow::from)
            .collect(),
        DbPool::MySql(pool) => sqlx::query_as::<_, MySqlBearerTokenRow>(&sql)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(BearerTokenRow::from)
            .collect(),
    };

    Ok(rows)
}

pub async fn get(db: &DbPool, table: &str, id: &str) -> RepoResult<Option<BearerTokenRow>> {
    let row = match db {
        DbPool::Postgres(pool) => {
            let sql = format!(
                "SELECT id, name, hash, scopes, expires, created FROM {table} WHERE id = $1"
            );
            sqlx::query_as::<_, PgBearerTokenRow>(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await?
                .map(BearerTokenRow::from)
        }
        DbPool::MySql(pool) => {
            let sql = format!(
                "SELECT id, name, hash, scopes, expires, created FROM {table} WHERE id = ?"
            );
            sqlx::query_as::<_, MySqlBearerTokenRow>(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await?
                .map(BearerTokenRow::from)
        }
    };

    Ok(row)
}

pub async fn insert(
    db: &DbPool,
    table: &str,
    token: NewBearerToken<'_>,
    now: DateTime<Utc>,
) -> RepoResult<()> {
    match db {
        DbPool::Postgres(pool) => {
            let sql = format!(
                "INSERT INTO {table} (id, name, hash, scopes, expires, created) \
                 VALUES ($1, $2, $3, $4, $5, $6)"
            );
            sqlx::query(&sql)
                .bind(token.id)
                .bind(token.name)
                .bind(token.hash)
                .bind(token.scopes)
                .bind(token.expires)
                .bind(now)
                .execute(pool)
                .await?;
        }
        DbPool::MySql(pool) => {
            let sql = format!(
                "INSERT INTO {table} (id, name, hash, scopes, expires, created) \
                 VALUES (?, ?, ?, ?, ?, ?)"
            );
            // serializing a slice of strings cannot fail
            let scopes = serde_json::to_string(token.scopes).unwrap_or_else(|_| "[]".to_string());
            sqlx::query(&sql)
                .bind(token.id)
                .bind(token.name)
                .bind(token.hash)
                .bind(scopes)
                .bind(token.expires)
                .bind(now)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}

pub async fn delete(db: &DbPool, table: &str, id: &str) -> RepoResult<bool> {
    let affected = match db {
        DbPool::Postgres(pool) => {
            let sql = format!("DELETE FROM {table} WHERE id = $1");
            sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await?
                .rows_affected()
        }
        DbPool::MySql(pool) => {
            let sql = format!("DELETE FROM {table} WHERE id = ?");
            sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await?
                .rows_affected()
        }
    };

    Ok(affected > 0)
}
