//! Legacy `/lobby/{key}/{port}` protocol.
//!
//! Older clients only ever check in, on any verb. They are served from a
//! separate registry so the two protocols never share lobbies.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::api::dto::LobbyResponse;
use crate::api::validation::{LEGACY_VERSION, RegistrationRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::rate_limit::ClientIp;

/// `GET|PUT /lobby/{key}/{port}` — Legacy check-in.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid key, port, or address.
#[utoipa::path(
    put,
    path = "/lobby/{key}/{port}",
    tag = "Legacy",
    summary = "Legacy check-in",
    description = "Check-in for legacy clients. Also served on GET. Lobbies are created with version v0.0.0.",
    params(
        ("key" = String, Path, description = "Lobby key"),
        ("port" = u16, Path, description = "Port the caller is reachable on"),
    ),
    responses(
        (status = 200, description = "Lobby after check-in", body = LobbyResponse),
        (status = 400, description = "Invalid key, port, or address", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn legacy_check_in(
    State(state): State<AppState>,
    Extension(ClientIp(client)): Extension<ClientIp>,
    Path((key, port)): Path<(String, String)>,
) -> Result<Json<LobbyResponse>, GatewayError> {
    let request = RegistrationRequest::parse(&key, &port, client, state.allow_ipv6)?;

    let snapshot = state
        .legacy_service
        .check_in(&request.key, LEGACY_VERSION, request.address, request.port)
        .await;

    Ok(Json(LobbyResponse::new(
        snapshot,
        request.address,
        request.port,
    )))
}

/// Legacy routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/lobby/{key}/{port}",
        get(legacy_check_in).put(legacy_check_in),
    )
}
