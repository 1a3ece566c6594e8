use crate::config::RateLimitConfig;
use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::{self as axum_middleware, Next},
    response::Response,
    Router,
};
use std::net::IpAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};

/// Headers the rate limiter would otherwise trust for the client address.
const FORWARDING_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "forwarded"];

/// Per-client quota of `max_requests` per `window`, refilled evenly across
/// the window. Clients are keyed by the trusted proxy header, else by peer
/// address, so the server must be run with connect info.
pub fn with_rate_limit(router: Router, config: &RateLimitConfig) -> Result<Router> {
    let replenish_ms = (config.window.as_millis() / u128::from(config.max_requests)).max(1);
    let replenish_ms = u64::try_from(replenish_ms).context("Rate limit window too large")?;

    let governor = GovernorConfigBuilder::default()
        .per_millisecond(replenish_ms)
        .burst_size(config.max_requests)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .context("Invalid rate limit configuration")?;

    tracing::info!(
        max_requests = config.max_requests,
        window_secs = config.window.as_secs(),
        client_ip_header = %config.client_ip_header,
        "Rate limiting enabled"
    );

    let client_ip_header = Arc::new(
        HeaderName::from_bytes(config.client_ip_header.as_bytes())
            .context("Invalid CLIENT_IP_HEADER")?,
    );

    // The layer borrows its config for the life of the process.
    let governor = Box::leak(Box::new(governor));

    // Outermost layer runs first: normalize headers, then apply the quota.
    Ok(router
        .layer(GovernorLayer { config: governor })
        .layer(axum_middleware::from_fn(move |req, next| {
            let header = client_ip_header.clone();
            async move { client_ip_layer(header, req, next).await }
        })))
}

/// Client address from the trusted proxy header, if it holds a valid IP.
pub fn resolve_client_ip(headers: &HeaderMap, client_ip_header: &HeaderName) -> Option<IpAddr> {
    headers
        .get(client_ip_header)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Replaces client-controlled forwarding headers with the address from the
/// trusted proxy header. Without that header the limiter keys on the peer
/// address.
pub async fn client_ip_layer(
    client_ip_header: Arc<HeaderName>,
    mut request: Request,
    next: Next,
) -> Response {
    let client_ip = resolve_client_ip(request.headers(), &client_ip_header);

    let headers = request.headers_mut();
    for name in FORWARDING_HEADERS {
        headers.remove(name);
    }
    if let Some(ip) = client_ip {
        if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
            headers.insert("x-forwarded-for", value);
        }
    }

    next.run(request).await
}
