/*
 * Responsibility
 * - route ごとに宣言された scope を、handler 実行前に検査する extractor
 * - bearer auth が無効な deployment では検査しない (常に通す)
 *
 * 置くもの
 *  - Authorized<T> の定義と FromRequestParts 実装
 *  - ScopeTag trait
 * 置かないもの
 *  - 具体的な scope 名 (types.rs)
 *
 * Notes
 *  - handler の引数では State の直後に置く。Path / Query / Json より先に評価され、
 *    scope 不足なら body の parse も DB アクセスも起きない
 */
use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::scope;
use crate::state::AppState;

/// Binds a route to the scope it requires.
pub trait ScopeTag {
    const SCOPE: &'static str;
}

pub struct Authorized<T> {
    ctx: Option<AuthCtx>,
    _marker: PhantomData<T>,
}

impl<T> Authorized<T> {
    fn new(ctx: Option<AuthCtx>) -> Self {
        Self {
            ctx,
            _marker: PhantomData,
        }
    }

    /// Client name for log fields.
    pub fn client(&self) -> &str {
        self.ctx.as_ref().map(AuthCtx::client).unwrap_or("anonymous")
    }
}

impl<T> FromRequestParts<AppState> for Authorized<T>
where
    T: ScopeTag + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.bearer_auth_enabled() {
            return Ok(Self::new(None));
        }

        // Only the bearer middleware inserts AuthCtx; absent means it did not run.
        let ctx = parts
            .extensions
            .get::<AuthCtx>()
            .ok_or_else(AppError::invalid_authorization_header)?;

        if !scope::authorize(ctx, T::SCOPE) {
            tracing::warn!(
                client = %ctx.client(),
                required = T::SCOPE,
                method = %parts.method,
                "scope check failed"
            );
            return Err(AppError::ScopeDenied {
                method: parts.method.to_string(),
            });
        }

        Ok(Self::new(Some(ctx.clone())))
    }
}

impl<T> std::fmt::Debug for Authorized<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized").field("ctx", &self.ctx).finish()
    }
}
