//! Per-client rate limiting.
//!
//! - keyed by peer IP (`ConnectInfo<SocketAddr>`); requests without one are not limited
//! - quota: `RATE_LIMIT_MAX_CONNECTIONS_PER_MIN`, refilled evenly over the minute
//! - IPs in `RATE_LIMIT_EXCLUDED_ARRAY` bypass the limiter
//! - over quota → 429 with `retry-after` (seconds)

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    middleware::{self, Next},
    response::Response,
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};

use crate::config::RateLimitConfig;
use crate::error::AppError;

// Tracked keys before stale ones are swept.
const SWEEP_THRESHOLD: usize = 10_000;

pub struct IpRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
    excluded: Vec<IpAddr>,
}

impl std::fmt::Debug for IpRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpRateLimiter")
            .field("tracked", &self.limiter.len())
            .field("excluded", &self.excluded)
            .finish()
    }
}

impl IpRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.max_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            excluded: config.excluded.clone(),
        }
    }

    /// `Err(seconds to wait)` when `ip` is over quota.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        if self.excluded.contains(&ip) {
            return Ok(());
        }

        if self.limiter.len() > SWEEP_THRESHOLD {
            self.limiter.retain_recent();
        }

        self.limiter.check_key(&ip).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            // round up so a client never retries too early
            wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
        })
    }
}

pub fn apply(router: Router, config: &RateLimitConfig) -> Router {
    let limiter = Arc::new(IpRateLimiter::new(config));
    router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<IpRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = peer
        && let Err(retry_after_secs) = limiter.check(ip)
    {
        tracing::warn!(ip = %ip, retry_after_secs, "rate limit exceeded");
        return Err(AppError::TooManyRequests { retry_after_secs });
    }

    Ok(next.run(req).await)
}
