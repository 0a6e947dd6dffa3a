//! Bearer token authentication, independent of the HTTP layer.
//!
//! Per request: Extract -> Lookup -> Verify -> Attach.
//! - Extract: `Authorization: Bearer <token>`; a malformed header is rejected
//!   before any backend call.
//! - Lookup: one read against the credential store. A backend failure is
//!   `AuthError::Backend`, never an authentication failure.
//! - Verify: bcrypt against each candidate in turn, stopping at the first match.
//! - Attach: the matched record's scopes become the request's `AuthCtx`.
//!
//! Nothing is cached between requests.
use std::sync::Arc;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::credential_store::{CredentialStore, CredentialStoreError};
use crate::services::auth::hash;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed or missing authorization header")]
    InvalidHeader,

    #[error("no credential matched the presented token")]
    NoMatch,

    #[error(transparent)]
    Backend(#[from] CredentialStoreError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            // Same status and message for both, so callers learn nothing about which part failed.
            AuthError::InvalidHeader | AuthError::NoMatch => AppError::invalid_authorization_header(),
            AuthError::Backend(err) => {
                tracing::error!(error = ?err, "bearer auth backend unavailable");
                AppError::Internal
            }
        }
    }
}

#[derive(Clone)]
pub struct BearerAuth {
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

impl BearerAuth {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn authenticate(&self, header: Option<&HeaderValue>) -> Result<AuthCtx, AuthError> {
        let token = extract_token(header)?;

        let candidates = self.store.candidates(token).await?;

        for candidate in candidates {
            match hash::verify(token, &candidate.hash).await {
                Ok(true) => {
                    tracing::debug!(client = %candidate.name, "bearer token accepted");
                    return Ok(AuthCtx::new(candidate.name, candidate.scopes));
                }
                Ok(false) => continue,
                Err(err) => {
                    tracing::warn!(client = %candidate.name, error = %err, "stored bearer hash is unusable");
                }
            }
        }

        Err(AuthError::NoMatch)
    }
}

/// `Bearer <token68>`; the scheme is case-insensitive.
pub fn extract_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::InvalidHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeader);
    }

    let token = token.trim_start_matches(' ');
    if is_token68(token) {
        Ok(token)
    } else {
        Err(AuthError::InvalidHeader)
    }
}

// RFC 7235 token68: 1*( ALPHA / DIGIT / "-" / "." / "_" / "~" / "+" / "/" ) *"="
fn is_token68(token: &str) -> bool {
    let body = token.trim_end_matches('=');
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'+' | b'/'))
}
