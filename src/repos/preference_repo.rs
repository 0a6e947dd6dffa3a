/*
 * Responsibility
 * - patient preference の type / option (value) 一覧と、患者ごとの設定の取得・更新
 * - 更新は 1 transaction で複数行を upsert
 *
 * Assumed columns
 * - type table:     preference_type_id, preference_type
 * - value table:    preference_value_id, preference_type_id, preference_value
 * - patient table:  patient_id, preference_type_id, preference_value_id,
 *                   preference_priority, created, last_updated
 *                   UNIQUE (patient_id, preference_type_id)
 */
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::config::Tables;
use crate::repos::{DbPool, error::RepoResult};

#[derive(Debug, Clone, FromRow)]
pub struct PreferenceTypeRow {
    pub preference_type_id: i32,
    pub preference_type: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PreferenceOptionRow {
    pub preference_type_id: i32,
    pub preference_option_display: String,
    pub preference_option_value: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserPreferenceRow {
    pub patient_id: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub preference_type_id: i32,
    pub preference_type: String,
    pub preference_value_id: i32,
    pub preference_priority: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceUpdate {
    pub type_id: i32,
    pub priority: i32,
    pub value_id: i32,
}

pub async fn list_types(db: &DbPool, tables: &Tables) -> RepoResult<Vec<PreferenceTypeRow>> {
    let sql = format!(
        "SELECT preference_type_id, preference_type FROM {} ORDER BY preference_type_id",
        tables.patient_preferences_type
    );

    let rows = match db {
        DbPool::Postgres(pool) => {
            sqlx::query_as::<_, PreferenceTypeRow>(&sql)
                .fetch_all(pool)
                .await?
        }
        DbPool::MySql(pool) => {
            sqlx::query_as::<_, PreferenceTypeRow>(&sql)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

pub async fn list_options(db: &DbPool, tables: &Tables) -> RepoResult<Vec<PreferenceOptionRow>> {
    let sql = format!(
        "SELECT preference_type_id, preference_value AS preference_option_display, \
         preference_value_id AS preference_option_value \
         FROM {} ORDER BY preference_type_id, preference_value_id",
        tables.patient_preferences_value
    );

    let rows = match db {
        DbPool::Postgres(pool) => {
            sqlx::query_as::<_, PreferenceOptionRow>(&sql)
                .fetch_all(pool)
                .await?
        }
        DbPool::MySql(pool) => {
            sqlx::query_as::<_, PreferenceOptionRow>(&sql)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

pub async fn get_user(
    db: &DbPool,
    tables: &Tables,
    patient_id: &str,
) -> RepoResult<Vec<UserPreferenceRow>> {
    let head = format!(
        "SELECT p.patient_id, p.created, p.last_updated, p.preference_type_id, \
         t.preference_type, p.preference_value_id, p.preference_priority \
         FROM {} p JOIN {} t ON t.preference_type_id = p.preference_type_id",
        tables.patient_preferences, tables.patient_preferences_type
    );

    let rows = match db {
        DbPool::Postgres(pool) => {
            let sql = format!("{head} WHERE p.patient_id = $1 ORDER BY p.preference_priority");
            sqlx::query_as::<_, UserPreferenceRow>(&sql)
                .bind(patient_id)
                .fetch_all(pool)
                .await?
        }
        DbPool::MySql(pool) => {
            let sql = format!("{head} WHERE p.patient_id = ? ORDER BY p.preference_priority");
            sqlx::query_as::<_, UserPreferenceRow>(&sql)
                .bind(patient_id)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// Upserts every entry in one transaction; either all land or none do.
pub async fn upsert_user(
    db: &DbPool,
    tables: &Tables,
    patient_id: &str,
    updates: &[PreferenceUpdate],
    now: DateTime<Utc>,
) -> RepoResult<()> {
    let table = &tables.patient_preferences;

    match db {
        DbPool::Postgres(pool) => {
            let sql = format!(
                "INSERT INTO {table} (patient_id, preference_type_id, preference_value_id, \
                 preference_priority, created, last_updated) VALUES ($1, $2, $3, $4, $5, $5) \
                 ON CONFLICT (patient_id, preference_type_id) DO UPDATE SET \
                 preference_value_id = EXCLUDED.preference_value_id, \
                 preference_priority = EXCLUDED.preference_priority, \
                 last_updated = EXCLUDED.last_updated"
            );
            let mut tx = pool.begin().await?;
            for u in updates {
                sqlx::query(&sql)
                    .bind(patient_id)
                    .bind(u.type_id)
                    .bind(u.value_id)
                    .bind(u.priority)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
        }
        DbPool::MySql(pool) => {
            let sql = format!(
                "INSERT INTO {table} (patient_id, preference_type_id, preference_value_id, \
                 preference_priority, created, last_updated) VALUES (?, ?, ?, ?, ?, ?) \
                 ON DUPLICATE KEY UPDATE \
                 preference_value_id = VALUES(preference_value_id), \
                 preference_priority = VALUES(preference_priority), \
                 last_updated = VALUES(last_updated)"
            );
            let mut tx = pool.begin().await?;
            for u in updates {
                sqlx::query(&sql)
                    .bind(patient_id)
                    .bind(u.type_id)
                    .bind(u.value_id)
                    .bind(u.priority)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
        }
    }

    Ok(())
}
