//! Concurrent lobby storage with per-lobby fine-grained locking.
//!
//! [`LobbyRegistry`] stores all live lobbies in a `HashMap` guarded by a
//! [`tokio::sync::RwLock`]. Each [`Lobby`] carries its own independent lock,
//! so operations on different keys only contend on the brief map access
//! needed for lookup, insert, or delete.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::member::MEMBER_TIMEOUT;
use super::{Lobby, LobbyKey};

/// Default period of the background sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Central store for all live lobbies.
///
/// # Concurrency
///
/// - The map lock and each lobby's lock are never held together.
/// - Lookups clean the returned lobby after the map lock is released and
///   evict it if it turned out to be empty.
/// - Removal is by identity: a key is only dropped if it still maps to the
///   lobby instance the caller observed.
#[derive(Debug)]
pub struct LobbyRegistry {
    name: &'static str,
    lobbies: RwLock<HashMap<LobbyKey, Arc<Lobby>>>,
}

impl LobbyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::named("lobbies")
    }

    /// Creates an empty registry whose log lines are tagged with `name`.
    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            lobbies: RwLock::new(HashMap::new()),
        }
    }

    /// Name used to tag log lines.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the lobby for `key`, creating it with `version` if absent.
    ///
    /// An existing lobby is cleaned before it is returned so stale members
    /// never leak into the caller's response. If cleaning empties it, it is
    /// evicted and a fresh lobby takes its place.
    pub async fn lookup_or_create(&self, key: &LobbyKey, version: &str) -> Arc<Lobby> {
        loop {
            let existing = {
                let mut map = self.lobbies.write().await;
                match map.get(key) {
                    Some(lobby) => Arc::clone(lobby),
                    None => {
                        let lobby = Arc::new(Lobby::new(key.clone(), version.to_owned()));
                        map.insert(key.clone(), Arc::clone(&lobby));
                        tracing::info!(registry = self.name, %key, version, "lobby created");
                        return lobby;
                    }
                }
            };

            if !existing.clean(MEMBER_TIMEOUT).await.retired {
                return existing;
            }
            self.evict(key, &existing).await;
        }
    }

    /// Returns the lobby for `key` without creating one.
    ///
    /// The lobby is cleaned first; a lobby that ends up retired is evicted
    /// and reported as absent.
    pub async fn get(&self, key: &LobbyKey) -> Option<Arc<Lobby>> {
        let lobby = self.lobbies.read().await.get(key).map(Arc::clone)?;
        if lobby.clean(MEMBER_TIMEOUT).await.retired {
            self.evict(key, &lobby).await;
            return None;
        }
        Some(lobby)
    }

    /// Removes `key` if it still maps to `lobby`. Returns whether it did.
    pub async fn evict(&self, key: &LobbyKey, lobby: &Arc<Lobby>) -> bool {
        let mut map = self.lobbies.write().await;
        if map
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, lobby))
        {
            map.remove(key);
            tracing::debug!(registry = self.name, %key, "lobby evicted");
            true
        } else {
            false
        }
    }

    /// Cleans every lobby and removes the ones left empty.
    ///
    /// Phase one snapshots the entries under the shared map lock, then
    /// cleans each lobby with the map lock released. Phase two takes the
    /// exclusive map lock once to drop the collected keys. Returns the
    /// number of lobbies removed.
    pub async fn sweep(&self) -> usize {
        let entries: Vec<(LobbyKey, Arc<Lobby>)> = {
            let map = self.lobbies.read().await;
            map.iter()
                .map(|(key, lobby)| (key.clone(), Arc::clone(lobby)))
                .collect()
        };

        let mut emptied = Vec::new();
        for (key, lobby) in entries {
            lobby.clean(MEMBER_TIMEOUT).await;
            if lobby.retire_if_empty().await {
                emptied.push((key, lobby));
            }
        }
        if emptied.is_empty() {
            return 0;
        }

        let mut map = self.lobbies.write().await;
        let mut removed = 0;
        for (key, lobby) in emptied {
            if map
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &lobby))
            {
                map.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Runs [`Self::sweep`] every `period` on a background task.
    ///
    /// The first sweep happens one full period after the call.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = self.sweep().await;
                let remaining = self.len().await;
                if removed > 0 {
                    tracing::info!(registry = self.name, removed, remaining, "swept empty lobbies");
                } else {
                    tracing::debug!(registry = self.name, remaining, "sweep found nothing to remove");
                }
            }
        })
    }

    /// Returns the keys currently in the registry.
    pub async fn keys(&self) -> Vec<LobbyKey> {
        self.lobbies.read().await.keys().cloned().collect()
    }

    /// Returns the number of lobbies in the registry.
    pub async fn len(&self) -> usize {
        self.lobbies.read().await.len()
    }

    /// Returns `true` if the registry contains no lobbies.
    pub async fn is_empty(&self) -> bool {
        self.lobbies.read().await.is_empty()
    }
}

impl Default for LobbyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
