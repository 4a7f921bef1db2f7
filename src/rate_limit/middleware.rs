//! Axum middleware putting the [`RateLimiter`](super::RateLimiter) in front
//! of every route.

use std::net::SocketAddr;

use axum::RequestExt;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::ClientIp;
use crate::app_state::AppState;
use crate::error::GatewayError;

/// Admits or rejects the request based on its client's token bucket.
///
/// On admission the resolved [`ClientIp`] is inserted into the request
/// extensions for the handlers.
///
/// # Errors
///
/// Returns [`GatewayError::RateLimited`] when the client's bucket is empty,
/// or [`GatewayError::Internal`] when no client address can be derived.
pub async fn rate_limit(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let peer = request
        .extract_parts::<ConnectInfo<SocketAddr>>()
        .await
        .ok()
        .map(|ConnectInfo(addr)| addr.ip());
    let client_ip = state
        .client_ip_policy
        .resolve(request.headers(), peer)
        .ok_or_else(|| GatewayError::Internal("client address unavailable".to_string()))?;

    if !state.rate_limiter.allow(client_ip).await {
        tracing::warn!(%client_ip, "rate limit exceeded");
        let retry_after_ms =
            u64::try_from(state.rate_limiter.retry_after().as_millis()).unwrap_or(u64::MAX);
        return Err(GatewayError::RateLimited { retry_after_ms });
    }

    request.extensions_mut().insert(ClientIp(client_ip));
    Ok(next.run(request).await)
}
