//! CORS policy for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Server-to-server calls are not restricted by it.
//! - With no configured origin the layer is not installed at all, so no CORS headers are sent.
//!
//! Policy:
//! - `CORS_ORIGIN=*`: any origin. With credentials enabled the request origin is mirrored
//!   instead, since browsers reject `*` together with credentials.
//! - Comma list: exact-match allowlist.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{CorsConfig, CorsOrigin};

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 10);

/// Apply CORS policy to the given Router.
pub fn apply(router: Router, config: &CorsConfig) -> Router {
    match layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn layer(config: &CorsConfig) -> Option<CorsLayer> {
    let allow_origin = match config.origin.as_ref()? {
        CorsOrigin::Any if config.allow_credentials => AllowOrigin::mirror_request(),
        CorsOrigin::Any => AllowOrigin::any(),
        CorsOrigin::List(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|s| HeaderValue::from_str(s).ok())
                .collect();
            AllowOrigin::list(allowed)
        }
    };

    let allowed_headers = if config.allowed_headers.is_empty() {
        vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ]
    } else {
        header_names(&config.allowed_headers)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(allowed_headers)
            .expose_headers(header_names(&config.exposed_headers))
            .allow_credentials(config.allow_credentials)
            .max_age(config.max_age.unwrap_or(DEFAULT_MAX_AGE)),
    )
}

fn header_names(names: &[String]) -> Vec<HeaderName> {
    names
        .iter()
        .filter_map(|n| match HeaderName::try_from(n.as_str()) {
            Ok(name) => Some(name),
            Err(_) => {
                tracing::warn!(header = %n, "ignoring invalid CORS header name");
                None
            }
        })
        .collect()
}
