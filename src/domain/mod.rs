//! Domain layer: members, lobbies, and the lobby registry.
//!
//! This module contains the rendezvous core: validated lobby keys, member
//! endpoints with their staleness predicate, lobbies with check-in,
//! check-out and pruning, and the registry that owns every live lobby.

pub mod lobby;
pub mod lobby_key;
pub mod member;
pub mod registry;

pub use lobby::{CheckOutOutcome, CleanReport, Lobby, LobbySnapshot};
pub use lobby_key::LobbyKey;
pub use member::{MEMBER_TIMEOUT, Member, MemberSnapshot};
pub use registry::{LobbyRegistry, SWEEP_INTERVAL};
