//! Lobby service: orchestrates registration flows over a registry.

use std::net::IpAddr;
use std::sync::Arc;

use crate::domain::{CheckOutOutcome, LobbyKey, LobbyRegistry, LobbySnapshot};

/// Orchestration layer for check-in, check-out, and lookup.
///
/// Stateless coordinator over a shared [`LobbyRegistry`]. Every method
/// follows the pattern: resolve the lobby → run the lobby operation →
/// snapshot under the lobby's shared lock → return.
#[derive(Debug, Clone)]
pub struct LobbyService {
    registry: Arc<LobbyRegistry>,
}

impl LobbyService {
    /// Creates a new `LobbyService`.
    #[must_use]
    pub fn new(registry: Arc<LobbyRegistry>) -> Self {
        Self { registry }
    }

    /// Returns a reference to the inner [`LobbyRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<LobbyRegistry> {
        &self.registry
    }

    /// Registers `(address, port)` in lobby `key`, creating the lobby with
    /// `version` if it does not exist.
    ///
    /// If the resolved lobby retires before the check-in lands, it is
    /// evicted and the check-in is retried against a fresh lobby.
    pub async fn check_in(
        &self,
        key: &LobbyKey,
        version: &str,
        address: IpAddr,
        port: u16,
    ) -> LobbySnapshot {
        loop {
            let lobby = self.registry.lookup_or_create(key, version).await;
            if lobby.check_in(address, port).await {
                tracing::debug!(registry = self.registry.name(), %key, %address, port, "checked in");
                return lobby.snapshot().await;
            }
            self.registry.evict(key, &lobby).await;
        }
    }

    /// Removes `(address, port)` from lobby `key`.
    ///
    /// Returns the remaining lobby, or `None` if the key is unknown or the
    /// lobby was emptied and removed. An unknown key is never created.
    pub async fn check_out(
        &self,
        key: &LobbyKey,
        address: IpAddr,
        port: u16,
    ) -> Option<LobbySnapshot> {
        let lobby = self.registry.get(key).await?;
        match lobby.check_out(&self.registry, address, port).await {
            CheckOutOutcome::Emptied => None,
            CheckOutOutcome::Left => {
                tracing::debug!(registry = self.registry.name(), %key, %address, port, "checked out");
                Some(lobby.snapshot().await)
            }
            CheckOutOutcome::NotMember => Some(lobby.snapshot().await),
        }
    }

    /// Returns the current state of lobby `key` without creating it.
    pub async fn lookup(&self, key: &LobbyKey) -> Option<LobbySnapshot> {
        let lobby = self.registry.get(key).await?;
        Some(lobby.snapshot().await)
    }

    /// Number of live lobbies.
    pub async fn lobby_count(&self) -> usize {
        self.registry.len().await
    }
}
