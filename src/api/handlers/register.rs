/*
 * Responsibility
 * - GET /documents/register
 * - lastModified の比較条件で document register を検索し、ページングして返す
 */
use axum::{
    Json,
    extract::{RawQuery, State},
};

use crate::{
    api::dto::register::{RegisterQuery, RegisterResponse},
    api::extractors::scope::CanSearchRegister,
    error::AppError,
    repos::document_register_repo,
    state::AppState,
};

pub async fn search_register(
    State(state): State<AppState>,
    auth: CanSearchRegister,
    RawQuery(raw): RawQuery,
) -> Result<Json<RegisterResponse>, AppError> {
    let query = RegisterQuery::parse(raw.as_deref()).map_err(AppError::bad_request)?;

    let (total, rows) = document_register_repo::search(
        &state.db,
        &state.tables.document_register,
        &query.filters,
        query.per_page,
        query.offset(),
    )
    .await?;

    tracing::debug!(client = %auth.client(), total, page = query.page, "register search");

    Ok(Json(RegisterResponse::new(rows, total, &query)))
}
