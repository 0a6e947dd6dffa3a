/*
 * Responsibility
 * - /admin/access/bearer-token 系 CRUD handler (admin basic auth の内側)
 * - 新規 token は平文をここで 1 回だけ返し、DB には bcrypt hash のみ保存する
 */
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::dto::bearer_tokens::{
        BearerTokenResponse, CreateBearerTokenRequest, CreatedBearerTokenResponse,
    },
    api::extractors::{ApiJson, ApiPath},
    error::AppError,
    repos::bearer_token_repo::{self, NewBearerToken},
    services::auth::{hash, token},
    state::AppState,
};

pub async fn list_tokens(
    State(state): State<AppState>,
) -> Result<Json<Vec<BearerTokenResponse>>, AppError> {
    let rows = bearer_token_repo::list(&state.db, &state.tables.bearer_token).await?;
    Ok(Json(rows.into_iter().map(BearerTokenResponse::from).collect()))
}

pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateBearerTokenRequest>,
) -> Result<(StatusCode, Json<CreatedBearerTokenResponse>), AppError> {
    let now = Utc::now();
    let scopes = req.validate(now).map_err(AppError::bad_request)?;

    let secret = token::generate_token().map_err(|err| {
        tracing::error!(error = %err, "os rng unavailable");
        AppError::Internal
    })?;
    let hashed = hash::hash(&secret, hash::DEFAULT_COST).await.map_err(|err| {
        tracing::error!(error = %err, "hashing new bearer token failed");
        AppError::Internal
    })?;

    let id = Uuid::new_v4().to_string();
    let name = req.name.trim();
    bearer_token_repo::insert(
        &state.db,
        &state.tables.bearer_token,
        NewBearerToken {
            id: &id,
            name,
            hash: &hashed,
            scopes: &scopes,
            expires: req.expires,
        },
        now,
    )
    .await?;

    tracing::info!(id = %id, name = %name, ?scopes, "bearer token issued");

    Ok((
        StatusCode::CREATED,
        Json(CreatedBearerTokenResponse {
            token: BearerTokenResponse {
                id,
                name: name.to_string(),
                scopes,
                expires: req.expires,
                created: now,
            },
            access_token: secret,
        }),
    ))
}

pub async fn get_token(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<BearerTokenResponse>, AppError> {
    let id = parse_token_id(&id)?;
    let row = bearer_token_repo::get(&state.db, &state.tables.bearer_token, &id)
        .await?
        .ok_or_else(|| AppError::not_found("Bearer token not found"))?;

    Ok(Json(row.into()))
}

pub async fn delete_token(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_token_id(&id)?;
    let deleted = bearer_token_repo::delete(&state.db, &state.tables.bearer_token, &id).await?;

    if deleted {
        tracing::info!(id = %id, "bearer token revoked");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Bearer token not found"))
    }
}

// Ids are issued as lower-case hyphenated UUIDs.
fn parse_token_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::bad_request("id must be a UUID"))
}
