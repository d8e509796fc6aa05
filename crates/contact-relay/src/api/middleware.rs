//! Per-client rate limiting and request logging.

use crate::error::RelayError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};
use tracing::{debug, warn};

/// Rate limiter keyed by client address.
pub type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

const FALLBACK_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(30) {
    Some(n) => n,
    None => unreachable!(),
};

/// Tracked clients above which idle entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// Per-client quota on the OTP endpoints, shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    pub clients: Arc<ClientLimiter>,
}

impl RateLimitState {
    /// Allow each client `requests_per_minute`. Zero falls back to 30.
    pub fn new(requests_per_minute: u32) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(FALLBACK_PER_MINUTE));

        Self {
            clients: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(1000)
    }

    /// Take one request from `client`'s quota.
    pub fn check(&self, client: IpAddr) -> Result<(), RelayError> {
        if self.clients.len() > PRUNE_THRESHOLD {
            self.clients.retain_recent();
        }

        self.clients
            .check_key(&client)
            .map_err(|_| RelayError::RateLimitExceeded)
    }
}

/// Address of the client behind `request`.
///
/// Proxy headers win over the socket address, since the relay is normally
/// deployed behind a platform load balancer. Requests with no usable address
/// share the unspecified address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    forwarded
        .or_else(real_ip)
        .or(peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rate limiting middleware.
///
/// Returns 429 Too Many Requests once the calling client exhausts its quota.
/// Other clients are unaffected.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, RelayError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer);

    if let Err(e) = rate_limit.check(client) {
        warn!(%client, uri = %request.uri(), "Rate limit exceeded");
        return Err(e);
    }

    Ok(next.run(request).await)
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_quota_is_per_client() {
        let state = RateLimitState::new(2);
        let a = ip("203.0.113.7");
        let b = ip("198.51.100.20");

        assert!(state.check(a).is_ok());
        assert!(state.check(a).is_ok());
        assert!(matches!(state.check(a), Err(RelayError::RateLimitExceeded)));

        assert!(state.check(b).is_ok());
        assert!(state.check(b).is_ok());
        assert!(state.check(b).is_err());
    }

    #[test]
    fn test_zero_limit_falls_back() {
        let state = RateLimitState::new(0);
        let client = ip("203.0.113.7");
        for _ in 0..30 {
            assert!(state.check(client).is_ok());
        }
        assert!(state.check(client).is_err());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.20"));
        let peer: SocketAddr = "10.0.0.1:4000".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer)), ip("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let peer: SocketAddr = "10.0.0.1:4000".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.20"));
        assert_eq!(client_ip(&headers, Some(peer)), ip("198.51.100.20"));

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("garbage"));
        assert_eq!(client_ip(&headers, Some(peer)), ip("10.0.0.1"));

        assert_eq!(
            client_ip(&HeaderMap::new(), None),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }
}
