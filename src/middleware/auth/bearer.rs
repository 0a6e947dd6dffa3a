//! Bearer token 検証 → AuthCtx を extensions に入れる
//!
//! - 検証そのもの (header 解析 / credential store / bcrypt) は `services::auth::BearerAuth`
//! - ここは HTTP との接着だけ: header を渡し、結果を extensions か AppError に変える
//! - route ごとの scope 検査は extractor (`api::extractors::scope`) 側

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{AuthError, BearerAuth};
use crate::state::AppState;

/// 業務 route に bearer 認証を掛ける。
///
/// `route_layer` なので、未定義 path は認証前に 404 になる。
pub fn apply(router: Router<AppState>, auth: Arc<BearerAuth>) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(auth, bearer_middleware))
}

async fn bearer_middleware(
    State(auth): State<Arc<BearerAuth>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // owned copy: the request itself is not Sync and must not be held across the await
    let header = req.headers().get(header::AUTHORIZATION).cloned();

    let auth_ctx = match auth.authenticate(header.as_ref()).await {
        Ok(ctx) => ctx,
        Err(err) => {
            if !matches!(err, AuthError::Backend(_)) {
                tracing::warn!(error = %err, method = %req.method(), path = %req.uri().path(), "bearer authentication failed");
            }
            return Err(err.into());
        }
    };

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
