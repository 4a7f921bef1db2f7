//! A named, concurrently accessed set of members.
//!
//! Every [`Lobby`] owns its membership behind its own
//! [`tokio::sync::RwLock`], independent of the registry's map lock. No
//! method here is ever called while the registry map lock is held, and no
//! method here acquires the map lock while holding the membership lock.
//!
//! # Retirement
//!
//! A lobby whose last member leaves (by check-out or by expiring) is marked
//! *retired* under its own lock. A retired lobby refuses check-ins, so a
//! caller still holding a reference to it after the registry has dropped
//! the key cannot register into an unreachable lobby. Callers that see a
//! refused check-in evict the lobby and retry against a fresh one.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::member::{Member, MemberSnapshot};
use super::{LobbyKey, LobbyRegistry};

#[derive(Debug, Default)]
struct Membership {
    members: Vec<Member>,
    retired: bool,
}

/// Result of [`Lobby::clean`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Number of stale members removed by this call.
    pub pruned: usize,
    /// Whether the lobby is retired after this call.
    pub retired: bool,
}

/// Result of [`Lobby::check_out`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutOutcome {
    /// No member matched the endpoint; nothing changed.
    NotMember,
    /// The member was removed and others remain.
    Left,
    /// The last member was removed; the lobby was retired and dropped from
    /// the registry.
    Emptied,
}

/// Named collection of registered endpoints sharing a coordination key.
#[derive(Debug)]
pub struct Lobby {
    key: LobbyKey,
    version: String,
    created_at: DateTime<Utc>,
    state: RwLock<Membership>,
}

impl Lobby {
    /// Creates an empty lobby. `version` is fixed for the lobby's lifetime.
    #[must_use]
    pub fn new(key: LobbyKey, version: String) -> Self {
        Self {
            key,
            version,
            created_at: Utc::now(),
            state: RwLock::new(Membership::default()),
        }
    }

    /// Lobby key.
    #[must_use]
    pub fn key(&self) -> &LobbyKey {
        &self.key
    }

    /// Protocol version tag supplied at creation.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Removes every member that is stale at the time of the call.
    ///
    /// A shared-lock pass counts stale members first; when there are none
    /// the exclusive lock is never taken. If every member is stale the
    /// membership is reset in one step and the lobby retires.
    pub async fn clean(&self, timeout: Duration) -> CleanReport {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            if state.retired {
                return CleanReport {
                    pruned: 0,
                    retired: true,
                };
            }
            if !state.members.iter().any(|m| m.is_stale(now, timeout)) {
                return CleanReport::default();
            }
        }

        let mut state = self.state.write().await;
        if state.retired {
            return CleanReport {
                pruned: 0,
                retired: true,
            };
        }
        let before = state.members.len();
        if state.members.iter().all(|m| m.is_stale(now, timeout)) {
            state.members.clear();
            state.retired = true;
        } else {
            state.members.retain(|m| !m.is_stale(now, timeout));
        }
        let pruned = before.saturating_sub(state.members.len());
        if pruned > 0 {
            tracing::debug!(key = %self.key, pruned, remaining = state.members.len(), "pruned stale members");
        }
        CleanReport {
            pruned,
            retired: state.retired,
        }
    }

    /// Registers `(address, port)`, or refreshes its timestamp if already
    /// present.
    ///
    /// Returns `false` without changing anything if the lobby is retired.
    pub async fn check_in(&self, address: IpAddr, port: u16) -> bool {
        let mut state = self.state.write().await;
        if state.retired {
            return false;
        }
        let now = Instant::now();
        match state.members.iter_mut().find(|m| m.matches(address, port)) {
            Some(member) => member.refresh(now),
            None => state.members.push(Member::new(address, port, now)),
        }
        true
    }

    /// Removes `(address, port)` from the lobby.
    ///
    /// Removing the only member retires the lobby and drops it from
    /// `registry`. The membership lock is released before the registry map
    /// lock is taken.
    pub async fn check_out(
        self: &Arc<Self>,
        registry: &LobbyRegistry,
        address: IpAddr,
        port: u16,
    ) -> CheckOutOutcome {
        let outcome = {
            let mut state = self.state.write().await;
            match state.members.iter().position(|m| m.matches(address, port)) {
                None => CheckOutOutcome::NotMember,
                Some(_) if state.members.len() == 1 => {
                    state.members.clear();
                    state.retired = true;
                    CheckOutOutcome::Emptied
                }
                Some(idx) => {
                    state.members.swap_remove(idx);
                    CheckOutOutcome::Left
                }
            }
        };

        if outcome == CheckOutOutcome::Emptied {
            registry.evict(&self.key, self).await;
            tracing::info!(key = %self.key, "lobby emptied");
        }
        outcome
    }

    /// Retires the lobby if it has no members. Returns whether it is retired.
    ///
    /// Non-empty lobbies are rejected on a shared-lock pass.
    pub async fn retire_if_empty(&self) -> bool {
        {
            let state = self.state.read().await;
            if state.retired {
                return true;
            }
            if !state.members.is_empty() {
                return false;
            }
        }
        let mut state = self.state.write().await;
        if state.members.is_empty() {
            state.retired = true;
        }
        state.retired
    }

    /// Returns `true` once the lobby has been retired.
    pub async fn is_retired(&self) -> bool {
        self.state.read().await.retired
    }

    /// Current number of members.
    pub async fn member_count(&self) -> usize {
        self.state.read().await.members.len()
    }

    /// Last check-in time of `(address, port)`, if it is a member.
    pub async fn last_seen(&self, address: IpAddr, port: u16) -> Option<Instant> {
        self.state
            .read()
            .await
            .members
            .iter()
            .find(|m| m.matches(address, port))
            .map(Member::last_seen)
    }

    /// Consistent read-only view of the lobby, taken under the shared lock.
    pub async fn snapshot(&self) -> LobbySnapshot {
        let state = self.state.read().await;
        LobbySnapshot {
            key: self.key.clone(),
            version: self.version.clone(),
            created_at: self.created_at,
            members: state.members.iter().map(Member::snapshot).collect(),
        }
    }
}

/// Point-in-time copy of a lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySnapshot {
    /// Lobby key.
    pub key: LobbyKey,
    /// Protocol version tag.
    pub version: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Members at the time of the snapshot.
    pub members: Vec<MemberSnapshot>,
}
