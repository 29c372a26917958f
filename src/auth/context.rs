use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use ipnet::IpNet;

use crate::state::SharedState;

/// Per-request facts the auth services need, resolved once at the edge.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source_ip: String,
    pub now: DateTime<Utc>,
}

impl FromRequestParts<SharedState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(RequestContext {
            source_ip: resolve_source_ip(&parts.headers, peer, &state.config.trusted_proxies),
            now: state.clock.now(),
        })
    }
}

/// Work out the client address for the login record.
///
/// With no trusted proxies configured, any `X-Forwarded-For` value is taken as
/// sent. With trusted proxies, the header only counts when the peer is one of
/// them, and the leftmost address that is not a proxy wins.
pub fn resolve_source_ip(
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    trusted_proxies: &[IpNet],
) -> String {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return peer.to_string();
    };

    if trusted_proxies.is_empty() {
        return forwarded.to_string();
    }

    if trusted_proxies.iter().any(|net| net.contains(&peer)) {
        for ip_str in forwarded.split(',').map(|s| s.trim()) {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                if !trusted_proxies.iter().any(|net| net.contains(&ip)) {
                    return ip.to_string();
                }
            }
        }
    }

    peer.to_string()
}
