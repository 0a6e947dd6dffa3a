/*
 * Responsibility
 * - URL 構造を定義
 * - 業務 route (documents / preferences) には bearer 認証、admin route には basic 認証を掛ける
 * - Accept (406) は認証より外側。healthcheck はどちらも通さない
 * - 未定義 method は 405 ではなく 404 (JSON)。認証 layer の外で返す
 *
 * 認証が無効な deployment では該当 layer を付けない (handler 側の scope 検査も素通り)
 */
use axum::{
    Router,
    http::{Method, Uri},
    routing::{get, put},
};

use crate::api::handlers::{
    bearer_tokens::{create_token, delete_token, get_token, list_tokens},
    health::healthcheck,
    preferences::{get_user_preferences, list_options, put_user_preferences},
    receipt::{delete_receipt, put_receipt},
    register::search_register,
};
use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let mut secured = Router::new()
        .route("/documents/register", get(search_register))
        .route(
            "/documents/receipt/{id}",
            put(put_receipt).delete(delete_receipt),
        )
        .route("/preferences/options", get(list_options))
        .route(
            "/preferences/user/{patient_id}",
            get(get_user_preferences).put(put_user_preferences),
        );
    if let Some(bearer) = state.bearer.clone() {
        secured = middleware::auth::bearer::apply(secured, bearer);
    }

    let mut api = secured;
    if let Some(admin) = state.admin.clone() {
        let admin_routes = Router::new()
            .route(
                "/admin/access/bearer-token",
                get(list_tokens).post(create_token),
            )
            .route(
                "/admin/access/bearer-token/{id}",
                get(get_token).delete(delete_token),
            );
        api = api.merge(middleware::auth::basic::apply(admin_routes, admin));
    } else {
        tracing::info!("admin credentials not configured; admin routes are not mounted");
    }

    middleware::accepts::apply(api)
        .route("/admin/healthcheck", get(healthcheck))
        // route_layer 済みの既定 405 を置き換えるので、認証も Accept も通らない
        .method_not_allowed_fallback(not_found)
        .fallback(not_found)
}

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(format!("Route {method}:{uri} not found"))
}
