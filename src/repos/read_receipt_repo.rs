/*
 * Responsibility
 * - document read receipt の upsert / delete
 * - (guid, patient_id) に UNIQUE 制約がある前提
 */
use chrono::{DateTime, Utc};

use crate::repos::{DbPool, error::RepoResult};

pub async fn upsert(
    db: &DbPool,
    table: &str,
    guid: &str,
    patient_id: &str,
    ts: DateTime<Utc>,
) -> RepoResult<()> {
    match db {
        DbPool::Postgres(pool) => {
            let sql = format!(
                "INSERT INTO {table} (guid, patient_id, ts) VALUES ($1, $2, $3) \
                 ON CONFLICT (guid, patient_id) DO UPDATE SET ts = EXCLUDED.ts"
            );
            sqlx::query(&sql)
                .bind(guid)
                .bind(patient_id)
                .bind(ts)
                .execute(pool)
                .await?;
        }
        DbPool::MySql(pool) => {
            // MySQL reports 0 affected rows for a no-op update, so the count is not checked.
            let sql = format!(
                "INSERT INTO {table} (guid, patient_id, ts) VALUES (?, ?, ?) \
                 ON DUPLICATE KEY UPDATE ts = VALUES(ts)"
            );
            sqlx::query(&sql)
                .bind(guid)
                .bind(patient_id)
                .bind(ts)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}

pub async fn delete(db: &DbPool, table: &str, guid: &str, patient_id: &str) -> RepoResult<bool> {
    let affected = match db {
        DbPool::Postgres(pool) => {
            let sql = format!("DELETE FROM {table} WHERE guid = $1 AND patient_id = $2");
            sqlx::query(&sql)
                .bind(guid)
                .bind(patient_id)
                .execute(pool)
                .await?
                .rows_affected()
        }
        DbPool::MySql(pool) => {
            let sql = format!("DELETE FROM {table} WHERE guid = ? AND patient_id = ?");
            sqlx::query(&sql)
                .bind(guid)
                .bind(patient_id)
                .execute(pool)
                .await?
                .rows_affected()
        }
    };

    Ok(affected > 0)
}
