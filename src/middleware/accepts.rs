//! Content negotiation: every response body is JSON, so a client that
//! refuses JSON gets 406 before authentication or any handler runs.
//!
//! A missing `Accept` header means "anything" and passes.

use axum::{
    Router,
    extract::Request,
    http::{HeaderMap, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.route_layer(middleware::from_fn(accepts_middleware))
}

async fn accepts_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    if !accepts_json(req.headers()) {
        return Err(AppError::NotAcceptable);
    }
    Ok(next.run(req).await)
}

fn accepts_json(headers: &HeaderMap) -> bool {
    let values: Vec<&str> = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        return true;
    }

    values
        .iter()
        .flat_map(|v| v.split(','))
        .any(media_range_admits_json)
}

fn media_range_admits_json(range: &str) -> bool {
    let mut parts = range.split(';');
    let media = parts.next().unwrap_or("").trim();

    // q=0 is an explicit refusal
    let refused = parts.any(|p| match p.trim().split_once('=') {
        Some((k, q)) if k.trim().eq_ignore_ascii_case("q") => q.trim().parse::<f32>() == Ok(0.0),
        _ => false,
    });
    if refused {
        return false;
    }

    media.eq_ignore_ascii_case("application/json")
        || media.eq_ignore_ascii_case("application/*")
        || media == "*/*"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_accept(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for v in values {
            headers.append(header::ACCEPT, HeaderValue::from_str(v).unwrap());
        }
        headers
    }

    #[test]
    fn negotiation() {
        assert!(accepts_json(&HeaderMap::new()));
        assert!(accepts_json(&with_accept(&["application/json"])));
        assert!(accepts_json(&with_accept(&["Application/JSON; charset=utf-8"])));
        assert!(accepts_json(&with_accept(&["text/html, */*;q=0.8"])));
        assert!(accepts_json(&with_accept(&["text/html", "application/*"])));

        assert!(!accepts_json(&with_accept(&["application/xml"])));
        assert!(!accepts_json(&with_accept(&["text/html, text/plain"])));
        assert!(!accepts_json(&with_accept(&["application/json;q=0"])));
    }
}
