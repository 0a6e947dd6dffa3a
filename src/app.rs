/*
 * Responsibility
 * - Config読み込み → tracing / panic hook → DB 接続 → AppState → Router 組み立て
 * - Middleware の適用順 (内側から): CORS → rate limit → security headers → HTTP (request id / trace / timeout)
 * - axum::serve() で起動し、Ctrl-C / SIGTERM で graceful shutdown
 */
use std::net::SocketAddr;
use std::{panic, process};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repos::DbPool;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing(log_level: &str) {
    // Prefer RUST_LOG if set; otherwise LOG_LEVEL.
    // Ex:
    // RUST_LOG=info,myydh_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("{log_level},tower_http=info"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost".
        tracing::error!(?info, "panic");

        // Development: fail fast. Production: default behavior, server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let db = DbPool::connect(&config.database).await?;
    tracing::info!(client = ?db.client(), "database pool ready");

    let state = AppState::new(&config, db.clone());
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    tracing::info!("server stopped");
    Ok(())
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::routes(&state).with_state(state);
    let router = middleware::cors::apply(router, &config.cors);
    let router = middleware::rate_limit::apply(router, &config.rate_limit);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router, config.request_timeout, config.request_body_limit)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminCredentials;
    use crate::services::auth::{
        BearerAuth,
        credential_store::{BearerCredential, testing::StaticCredentialStore},
        hash,
    };

    const GUID: &str = "efe4f61c-5bf7-4a5a-8b4e-9e8d9c6c9f0d";

    struct Harness {
        app: Router,
        store: Arc<StaticCredentialStore>,
    }

    async fn client_a() -> BearerCredential {
        BearerCredential {
            name: "ClientA".to_string(),
            hash: hash::hash("secret123", 4).await.unwrap(),
            scopes: vec!["documents/receipt.delete".to_string()],
        }
    }

    fn harness(store: Option<StaticCredentialStore>, admin: bool) -> Harness {
        let config = Config::for_tests();
        let store = Arc::new(store.unwrap_or_default());
        let bearer = (store.fail || !store.credentials.is_empty())
            .then(|| Arc::new(BearerAuth::new(store.clone())));

        let state = AppState {
            db: DbPool::unreachable(),
            tables: Arc::new(config.database.tables.clone()),
            bearer,
            admin: admin.then(|| {
                Arc::new(AdminCredentials {
                    username: "admin".to_string(),
                    password: "changeme".to_string(),
                })
            }),
        };

        Harness {
            app: build_router(state, &config),
            store,
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn delete_receipt_uri(patient_id: &str) -> String {
        format!("/documents/receipt/{GUID}?patientId={patient_id}")
    }

    #[tokio::test]
    async fn healthcheck_needs_nothing() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), true);

        let req = Request::get("/admin/healthcheck")
            .header(header::ACCEPT, "application/xml")
            .body(Body::empty())
            .unwrap();
        let res = h.app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn missing_header_is_401_without_lookup() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let (status, headers, body) = send(&h.app, request("GET", "/preferences/options", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            serde_json::json!({
                "error": "Unauthorized",
                "message": "invalid authorization header",
                "statusCode": 401
            })
        );
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cache-control"], "no-store, max-age=0, must-revalidate");
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_token_looks_like_missing_header() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let (_, _, missing) = send(&h.app, request("DELETE", &delete_receipt_uri("9999999999"), None)).await;
        let (status, _, unknown) = send(
            &h.app,
            request("DELETE", &delete_receipt_uri("9999999999"), Some("not-registered")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(missing, unknown);
        assert_eq!(h.store.calls(), 1);
    }

    #[tokio::test]
    async fn matching_scope_reaches_the_handler() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        // Handler-level validation proves auth and the scope check passed.
        let (status, _, body) = send(
            &h.app,
            request("DELETE", &delete_receipt_uri("123"), Some("secret123")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(h.store.calls(), 1);
    }

    #[tokio::test]
    async fn missing_scope_is_401_naming_the_method() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let uri = format!("/documents/receipt/{GUID}?patientId=9999999999&timestamp=2021-01-08T10:03:50Z");
        let (status, _, body) = send(&h.app, request("PUT", &uri, Some("secret123"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["message"],
            "You do not have permission to perform an HTTP PUT request on this route"
        );
    }

    #[tokio::test]
    async fn scope_is_checked_before_the_body_is_read() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let req = Request::put("/preferences/user/9999999999")
            .header(header::AUTHORIZATION, "Bearer secret123")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("not json"))
            .unwrap();
        let (status, _, _) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn each_request_authenticates_independently() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        for _ in 0..2 {
            let (status, _, _) = send(
                &h.app,
                request("DELETE", &delete_receipt_uri("123"), Some("secret123")),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        assert_eq!(h.store.calls(), 2);
    }

    #[tokio::test]
    async fn backend_outage_is_500_without_details() {
        let h = harness(Some(StaticCredentialStore::failing()), false);

        let (status, _, body) = send(
            &h.app,
            request("DELETE", &delete_receipt_uri("9999999999"), Some("secret123")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
        let text = body.to_string();
        assert!(!text.contains("10.0.0.5"));
        assert!(!text.contains("password"));
    }

    #[tokio::test]
    async fn database_failure_in_handler_is_500() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let (status, _, body) = send(
            &h.app,
            request("DELETE", &delete_receipt_uri("9999999999"), Some("secret123")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[tokio::test]
    async fn disabled_auth_skips_header_and_scopes() {
        let h = harness(None, false);

        let (status, _, _) = send(&h.app, request("DELETE", &delete_receipt_uri("123"), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // A header is ignored rather than verified.
        let (status, _, _) = send(
            &h.app,
            request("DELETE", &delete_receipt_uri("123"), Some("whatever")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn not_acceptable_comes_before_auth() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let req = Request::get("/preferences/options")
            .header(header::ACCEPT, "application/xml")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body["statusCode"], 406);
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);

        let (status, _, body) = send(&h.app, request("GET", "/nope", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route GET:/nope not found");
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_method_is_404_before_auth() {
        let h = harness(Some(StaticCredentialStore::new(vec![client_a().await])), false);
        let uri = format!("/documents/receipt/{GUID}");

        for token in [None, Some("not-registered"), Some("secret123")] {
            let (status, headers, body) = send(&h.app, request("POST", &uri, token)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(headers[header::CONTENT_TYPE], "application/json");
            assert_eq!(
                body,
                serde_json::json!({
                    "error": "Not Found",
                    "message": format!("Route POST:{uri} not found"),
                    "statusCode": 404
                })
            );
        }

        let (status, _, body) =
            send(&h.app, request("PATCH", "/preferences/options", Some("secret123"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route PATCH:/preferences/options not found");

        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn undecodable_path_segment_is_json_400() {
        let h = harness(None, false);

        let (status, _, body) =
            send(&h.app, request("GET", "/preferences/user/%FF", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn wrong_content_type_is_415_when_auth_is_off() {
        let h = harness(None, false);

        let req = Request::put("/preferences/user/9999999999")
            .header(header::CONTENT_TYPE, "application/xml")
            .body(Body::from("<preferences/>"))
            .unwrap();
        let (status, _, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["message"], "Unsupported Media Type: application/xml");
    }

    fn admin_request(method: &str, uri: &str, creds: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((u, p)) = creds {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode(format!("{u}:{p}"))),
            );
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn admin_routes_require_basic_auth() {
        let h = harness(None, true);

        let (status, headers, body) =
            send(&h.app, admin_request("GET", "/admin/access/bearer-token", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(body["message"], "Unauthorized");

        let (status, _, _) = send(
            &h.app,
            admin_request("GET", "/admin/access/bearer-token", Some(("admin", "wrong")), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_create_rejects_unknown_scopes() {
        let h = harness(None, true);

        let (status, _, body) = send(
            &h.app,
            admin_request(
                "POST",
                "/admin/access/bearer-token",
                Some(("admin", "changeme")),
                Some(serde_json::json!({"name": "ClientB", "scopes": ["documents/*"]})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "unknown scope 'documents/*'");
    }

    #[tokio::test]
    async fn admin_create_hashes_and_stores_the_token() {
        let h = harness(None, true);

        // Validation and hashing pass; the unreachable pool fails the insert.
        let (status, _, body) = send(
            &h.app,
            admin_request(
                "POST",
                "/admin/access/bearer-token",
                Some(("admin", "changeme")),
                Some(serde_json::json!({
                    "name": "ClientB",
                    "scopes": ["documents/receipt.put", "documents/receipt.put"]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal Server Error");
        assert!(body.get("access_token").is_none());
    }

    #[tokio::test]
    async fn admin_unsupported_method_is_404_without_basic_auth() {
        let h = harness(None, true);

        let (status, headers, body) =
            send(&h.app, admin_request("PUT", "/admin/access/bearer-token", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!headers.contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(body["message"], "Route PUT:/admin/access/bearer-token not found");
    }

    #[tokio::test]
    async fn admin_get_validates_the_id() {
        let h = harness(None, true);

        let (status, _, _) = send(
            &h.app,
            admin_request("GET", "/admin/access/bearer-token/42", Some(("admin", "changeme")), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_routes_absent_without_credentials() {
        let h = harness(None, false);

        let (status, _, body) = send(
            &h.app,
            admin_request("GET", "/admin/access/bearer-token", Some(("admin", "changeme")), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route GET:/admin/access/bearer-token not found");
    }
}
