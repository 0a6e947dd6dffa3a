/*
 * Responsibility
 * - PUT/DELETE /documents/receipt/{id}
 * - id は GUID として検証し、受け取った文字列のまま保存する
 */
use axum::{extract::State, http::StatusCode};

use crate::{
    api::dto::{
        receipt::{ReceiptDeleteQuery, ReceiptPutQuery},
        validate_guid,
    },
    api::extractors::{
        ApiPath, ApiQuery,
        scope::{CanDeleteReceipt, CanPutReceipt},
    },
    error::AppError,
    repos::read_receipt_repo,
    state::AppState,
};

pub async fn put_receipt(
    State(state): State<AppState>,
    auth: CanPutReceipt,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ReceiptPutQuery>,
) -> Result<StatusCode, AppError> {
    validate_guid(&id).map_err(AppError::bad_request)?;
    let ts = query.validate().map_err(AppError::bad_request)?;

    read_receipt_repo::upsert(&state.db, &state.tables.read_receipt, &id, &query.patient_id, ts)
        .await?;

    tracing::debug!(client = %auth.client(), guid = %id, "read receipt stored");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_receipt(
    State(state): State<AppState>,
    auth: CanDeleteReceipt,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ReceiptDeleteQuery>,
) -> Result<StatusCode, AppError> {
    validate_guid(&id).map_err(AppError::bad_request)?;
    query.validate().map_err(AppError::bad_request)?;

    let deleted =
        read_receipt_repo::delete(&state.db, &state.tables.read_receipt, &id, &query.patient_id)
            .await?;

    if deleted {
        tracing::debug!(client = %auth.client(), guid = %id, "read receipt deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(
            "Record does not exist or has already been deleted",
        ))
    }
}
