/*
 * Responsibility
 * - document register (read-only view) の検索 + 件数取得
 * - lastModified の比較条件は QueryBuilder で bind する (文字列連結しない)
 */
use chrono::{DateTime, Utc};
use sqlx::{Database, Encode, FromRow, MySql, Postgres, QueryBuilder, Type};

use crate::repos::{DbPool, error::RepoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifiedFilter {
    pub op: CompareOp,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RegisterRow {
    pub guid: String,
    pub fhir_id: Option<String>,
    pub title: Option<String>,
    pub clinic: Option<String>,
    pub document_type: Option<String>,
    pub specialty: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
}

const REGISTER_COLUMNS: &str =
    "guid, fhir_id, title, clinic, document_type, specialty, created, modified";

fn push_filters<DB>(qb: &mut QueryBuilder<'_, DB>, filters: &[ModifiedFilter])
where
    DB: Database,
    DateTime<Utc>: for<'q> Encode<'q, DB> + Type<DB>,
{
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push("modified ");
        qb.push(filter.op.as_sql());
        qb.push(" ");
        qb.push_bind(filter.at);
    }
}

/// Returns `(total matching rows, requested page)`.
pub async fn search(
    db: &DbPool,
    table: &str,
    filters: &[ModifiedFilter],
    limit: i64,
    offset: i64,
) -> RepoResult<(i64, Vec<RegisterRow>)> {
    let count_head = format!("SELECT COUNT(*) AS total FROM {table}");
    let select_head = format!("SELECT {REGISTER_COLUMNS} FROM {table}");

    let result = match db {
        DbPool::Postgres(pool) => {
            let mut count = QueryBuilder::<Postgres>::new(&count_head);
            push_filters(&mut count, filters);
            let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

            let mut select = QueryBuilder::<Postgres>::new(&select_head);
            push_filters(&mut select, filters);
            select.push(" ORDER BY modified DESC LIMIT ");
            select.push_bind(limit);
            select.push(" OFFSET ");
            select.push_bind(offset);
            let rows = select
                .build_query_as::<RegisterRow>()
                .fetch_all(pool)
                .await?;

            (total, rows)
        }
        DbPool::MySql(pool) => {
            let mut count = QueryBuilder::<MySql>::new(&count_head);
            push_filters(&mut count, filters);
            let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

            let mut select = QueryBuilder::<MySql>::new(&select_head);
            push_filters(&mut select, filters);
            select.push(" ORDER BY modified DESC LIMIT ");
            select.push_bind(limit);
            select.push(" OFFSET ");
            select.push_bind(offset);
            let rows = select
                .build_query_as::<RegisterRow>()
                .fetch_all(pool)
                .await?;

            (total, rows)
        }
    };

    Ok(result)
}
