//! Per-client fixed-window rate limiting.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Request count for one client inside the current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by client identity.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
            trust_forwarded_for: false,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            trust_forwarded_for: config.trust_forwarded_for,
            ..Self::new(config.max_requests, Duration::from_secs(config.window_secs))
        }
    }

    /// Identify the client a request is counted against.
    ///
    /// With `trust_forwarded_for`, the last `X-Forwarded-For` hop is used: it
    /// is the one appended by the fronting proxy, earlier hops are
    /// caller-controlled. Falls back to the peer address when the header is
    /// absent or unparseable.
    pub fn client_key(&self, headers: &HeaderMap, peer: SocketAddr) -> String {
        let forwarded = self
            .trust_forwarded_for
            .then(|| last_forwarded_hop(headers))
            .flatten();

        forwarded.unwrap_or_else(|| peer.ip()).to_string()
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request for `key`. On rejection returns the time left until
    /// the window resets.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            Ok(())
        } else {
            Err(self.window.saturating_sub(now.saturating_duration_since(entry.started)))
        }
    }

    /// Drop windows that have fully elapsed.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    pub fn prune_at(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Middleware rejecting clients over their request ceiling with 429.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = limiter.client_key(request.headers(), addr);

    match limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(client = %key, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited { retry_after }.into_response()
        }
    }
}

fn last_forwarded_hop(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .last()
        .and_then(|hop| hop.trim().parse().ok())
}
