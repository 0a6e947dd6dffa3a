/*
 * Responsibility
 * - GET /preferences/options
 * - GET/PUT /preferences/user/{patientId}
 */
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    api::dto::{
        preferences::{OptionsResponse, UpdateUserPreferencesRequest, UserPreferencesResponse},
        validate_patient_id,
    },
    api::extractors::{
        ApiJson, ApiPath,
        scope::{CanPutUserPreferences, CanSearchOptions, CanSearchUserPreferences},
    },
    error::AppError,
    repos::preference_repo,
    state::AppState,
};

pub async fn list_options(
    State(state): State<AppState>,
    _auth: CanSearchOptions,
) -> Result<Json<OptionsResponse>, AppError> {
    let types = preference_repo::list_types(&state.db, &state.tables).await?;
    let options = preference_repo::list_options(&state.db, &state.tables).await?;

    OptionsResponse::from_rows(types, options)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Invalid or expired search results"))
}

pub async fn get_user_preferences(
    State(state): State<AppState>,
    _auth: CanSearchUserPreferences,
    ApiPath(patient_id): ApiPath<String>,
) -> Result<Json<UserPreferencesResponse>, AppError> {
    validate_patient_id(&patient_id).map_err(AppError::bad_request)?;

    let rows = preference_repo::get_user(&state.db, &state.tables, &patient_id).await?;
    if rows.is_empty() {
        return Err(AppError::not_found("User not found"));
    }
    let options = preference_repo::list_options(&state.db, &state.tables).await?;

    UserPreferencesResponse::from_rows(&patient_id, rows, options)
        .map(Json)
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn put_user_preferences(
    State(state): State<AppState>,
    auth: CanPutUserPreferences,
    ApiPath(patient_id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateUserPreferencesRequest>,
) -> Result<StatusCode, AppError> {
    validate_patient_id(&patient_id).map_err(AppError::bad_request)?;
    let updates = req.validate().map_err(AppError::bad_request)?;

    preference_repo::upsert_user(&state.db, &state.tables, &patient_id, &updates, Utc::now())
        .await?;

    tracing::debug!(client = %auth.client(), entries = updates.len(), "user preferences stored");
    Ok(StatusCode::NO_CONTENT)
}
