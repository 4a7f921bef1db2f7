//! Client address derivation for admission control and registration.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolved client address, attached to each admitted request as an
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// How the client address is derived from a request.
///
/// Forwarding headers are only honored when `trust_proxy_headers` is set,
/// which is only safe behind a reverse proxy that overwrites them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientIpPolicy {
    /// Prefer `X-Forwarded-For`, then `X-Real-IP`, over the peer address.
    pub trust_proxy_headers: bool,
}

impl ClientIpPolicy {
    /// Resolves the client address.
    ///
    /// With trusted headers: the first `X-Forwarded-For` entry, else
    /// `X-Real-IP`, else the transport peer. Unparseable header values are
    /// skipped. IPv4-mapped IPv6 addresses are canonicalised to IPv4.
    #[must_use]
    pub fn resolve(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
        let forwarded = if self.trust_proxy_headers {
            first_forwarded_for(headers).or_else(|| header_ip(headers, X_REAL_IP))
        } else {
            None
        };
        forwarded.or(peer).map(|ip| ip.to_canonical())
    }
}

fn first_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    value.split(',').next().and_then(parse_ip)
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers.get(name)?.to_str().ok().and_then(parse_ip)
}

/// Accepts a bare address or an `address:port` pair.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}
