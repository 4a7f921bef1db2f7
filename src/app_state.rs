//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::LobbyRegistry;
use crate::rate_limit::{ClientIpPolicy, RateLimiter};
use crate::service::LobbyService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lobby service for the current protocol.
    pub lobby_service: Arc<LobbyService>,
    /// Lobby service for the legacy `/lobby/` protocol, over its own
    /// registry.
    pub legacy_service: Arc<LobbyService>,
    /// Admission control shared by every route.
    pub rate_limiter: Arc<RateLimiter>,
    /// Client address derivation.
    pub client_ip_policy: ClientIpPolicy,
    /// Accept IPv6 registrants.
    pub allow_ipv6: bool,
}

impl AppState {
    /// Builds fresh registries and a rate limiter from `config`.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            lobby_service: Arc::new(LobbyService::new(Arc::new(LobbyRegistry::named(
                "lobbies",
            )))),
            legacy_service: Arc::new(LobbyService::new(Arc::new(LobbyRegistry::named(
                "legacy",
            )))),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            client_ip_policy: ClientIpPolicy {
                trust_proxy_headers: config.trust_proxy_headers,
            },
            allow_ipv6: config.allow_ipv6,
        }
    }
}
