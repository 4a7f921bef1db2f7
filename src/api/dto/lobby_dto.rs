//! Lobby request and response DTOs.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{LobbySnapshot, MemberSnapshot};

/// One registered endpoint as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MemberDto {
    /// Registered address.
    pub ip: String,
    /// Registered port.
    pub port: u16,
}

impl From<MemberSnapshot> for MemberDto {
    fn from(member: MemberSnapshot) -> Self {
        Self {
            ip: member.address.to_string(),
            port: member.port,
        }
    }
}

/// Lobby state as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LobbyDto {
    /// Lobby key.
    pub key: String,
    /// Protocol version tag fixed at creation.
    pub version: String,
    /// Current members. Always an array, possibly empty.
    pub members: Vec<MemberDto>,
}

impl From<LobbySnapshot> for LobbyDto {
    fn from(snapshot: LobbySnapshot) -> Self {
        Self {
            key: snapshot.key.to_string(),
            version: snapshot.version,
            members: snapshot.members.into_iter().map(MemberDto::from).collect(),
        }
    }
}

/// Response to every lobby operation that returns state.
///
/// `ip` and `port` echo the caller's own endpoint so peers can tell
/// themselves apart from the other members.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LobbyResponse {
    /// Lobby state.
    pub lobby: LobbyDto,
    /// Caller's address as seen by the server.
    pub ip: String,
    /// Caller's port from the request path.
    pub port: u16,
}

impl LobbyResponse {
    /// Builds a response for the caller at `(caller, port)`.
    #[must_use]
    pub fn new(snapshot: LobbySnapshot, caller: IpAddr, port: u16) -> Self {
        Self {
            lobby: LobbyDto::from(snapshot),
            ip: caller.to_string(),
            port,
        }
    }
}

/// Optional query parameters for lobby routes.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VersionQuery {
    /// Protocol version tag applied when the lobby is created.
    pub version: Option<String>,
}
