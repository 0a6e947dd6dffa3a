//! HTTP Basic auth for the admin routes.
//!
//! - username / password are compared in constant time (`subtle`)
//! - every failure is the same 401 with a `WWW-Authenticate` challenge

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;

use crate::config::AdminCredentials;
use crate::error::AppError;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, admin: Arc<AdminCredentials>) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(admin, basic_middleware))
}

async fn basic_middleware(
    State(admin): State<Arc<AdminCredentials>>,
    req: Request,
    next: Next,
) -> Response {
    if is_authorized(req.headers(), &admin) {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "admin basic authentication failed");

    let mut res = AppError::Unauthorized("Unauthorized".to_string()).into_response();
    res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"admin\", charset=\"UTF-8\""),
    );
    res
}

fn is_authorized(headers: &HeaderMap, admin: &AdminCredentials) -> bool {
    let Some((username, password)) = decode_basic(headers) else {
        return false;
    };

    // Both comparisons always run.
    let user_ok = username.as_bytes().ct_eq(admin.username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(admin.password.as_bytes());
    bool::from(user_ok & pass_ok)
}

fn decode_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
