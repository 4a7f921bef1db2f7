//! OpenAPI document aggregating every annotated handler.

use utoipa::OpenApi;

use super::dto::{LobbyDto, LobbyResponse, MemberDto};
use super::handlers::{legacy, lobby, system};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of the lobby gateway.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "lobby-gateway",
        description = "Rendezvous lobbies: peers check in under a shared key, discover each other, and age out when they stop checking in."
    ),
    paths(
        lobby::check_in,
        lobby::check_out,
        lobby::lookup,
        legacy::legacy_check_in,
        system::health_handler,
    ),
    components(schemas(
        LobbyResponse,
        LobbyDto,
        MemberDto,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Lobbies", description = "Check-in, check-out, and lookup"),
        (name = "Legacy", description = "Protocol for older clients"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in ["/{key}/{port}", "/lobby/{key}/{port}", "/health"] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
