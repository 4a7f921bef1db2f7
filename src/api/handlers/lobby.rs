//! Lobby handlers: check-in, check-out, lookup.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::{Extension, Json, Router};

use crate::api::dto::{LobbyResponse, VersionQuery};
use crate::api::validation::{RegistrationRequest, parse_version};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::rate_limit::ClientIp;

/// `PUT /{key}/{port}` — Check in to a lobby.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid key, port, version, or address.
#[utoipa::path(
    put,
    path = "/{key}/{port}",
    tag = "Lobbies",
    summary = "Check in",
    description = "Registers the caller's address and the given port in the lobby, creating the lobby on first use. Repeated check-ins refresh the member instead of duplicating it.",
    params(
        ("key" = String, Path, description = "Lobby key"),
        ("port" = u16, Path, description = "Port the caller is reachable on"),
        VersionQuery,
    ),
    responses(
        (status = 200, description = "Lobby after check-in", body = LobbyResponse),
        (status = 400, description = "Invalid key, port, version, or address", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    Extension(ClientIp(client)): Extension<ClientIp>,
    Path((key, port)): Path<(String, String)>,
    Query(query): Query<VersionQuery>,
) -> Result<Json<LobbyResponse>, GatewayError> {
    let request = RegistrationRequest::parse(&key, &port, client, state.allow_ipv6)?;
    let version = parse_version(query.version.as_deref())?;

    let snapshot = state
        .lobby_service
        .check_in(&request.key, &version, request.address, request.port)
        .await;

    Ok(Json(LobbyResponse::new(
        snapshot,
        request.address,
        request.port,
    )))
}

/// `DELETE /{key}/{port}` — Check out of a lobby.
///
/// Unknown keys and unknown members are not errors.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid key, port, or address.
#[utoipa::path(
    delete,
    path = "/{key}/{port}",
    tag = "Lobbies",
    summary = "Check out",
    description = "Removes the caller's endpoint from the lobby. Removing the last member removes the lobby. Checking out of an unknown lobby is a no-op.",
    params(
        ("key" = String, Path, description = "Lobby key"),
        ("port" = u16, Path, description = "Port the caller registered"),
    ),
    responses(
        (status = 200, description = "Lobby after check-out", body = LobbyResponse),
        (status = 204, description = "Lobby is gone or never existed"),
        (status = 400, description = "Invalid key, port, or address", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn check_out(
    State(state): State<AppState>,
    Extension(ClientIp(client)): Extension<ClientIp>,
    Path((key, port)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    let request = RegistrationRequest::parse(&key, &port, client, state.allow_ipv6)?;

    let remaining = state
        .lobby_service
        .check_out(&request.key, request.address, request.port)
        .await;

    Ok(match remaining {
        Some(snapshot) => {
            Json(LobbyResponse::new(snapshot, request.address, request.port)).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// `GET /{key}/{port}` — Look up a lobby without joining it.
///
/// # Errors
///
/// Returns [`GatewayError::LobbyNotFound`] if no lobby has that key.
#[utoipa::path(
    get,
    path = "/{key}/{port}",
    tag = "Lobbies",
    summary = "Look up",
    description = "Returns the lobby's current members without registering the caller. Never creates a lobby.",
    params(
        ("key" = String, Path, description = "Lobby key"),
        ("port" = u16, Path, description = "Caller's port, echoed in the response"),
    ),
    responses(
        (status = 200, description = "Current lobby state", body = LobbyResponse),
        (status = 400, description = "Invalid key, port, or address", body = ErrorResponse),
        (status = 404, description = "Lobby not found", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    )
)]
pub async fn lookup(
    State(state): State<AppState>,
    Extension(ClientIp(client)): Extension<ClientIp>,
    Path((key, port)): Path<(String, String)>,
) -> Result<Json<LobbyResponse>, GatewayError> {
    let request = RegistrationRequest::parse(&key, &port, client, state.allow_ipv6)?;

    let snapshot = state
        .lobby_service
        .lookup(&request.key)
        .await
        .ok_or_else(|| GatewayError::LobbyNotFound(request.key.to_string()))?;

    Ok(Json(LobbyResponse::new(
        snapshot,
        request.address,
        request.port,
    )))
}

/// Lobby routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/{key}/{port}", put(check_in).delete(check_out).get(lookup))
}
