//! A single registered endpoint inside a lobby.

use std::net::IpAddr;
use std::time::Duration;

use tokio::time::Instant;

/// How long a member may go without checking in before it is pruned.
pub const MEMBER_TIMEOUT: Duration = Duration::from_secs(30);

/// One registered `(address, port)` endpoint with its freshness timestamp.
///
/// Identity is the `(address, port)` pair; there is no assigned id. The
/// timestamp is a monotonic [`Instant`] and is never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    address: IpAddr,
    port: u16,
    last_seen: Instant,
}

impl Member {
    /// Creates a member first seen at `now`.
    #[must_use]
    pub const fn new(address: IpAddr, port: u16, now: Instant) -> Self {
        Self {
            address,
            port,
            last_seen: now,
        }
    }

    /// Registered address.
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Registered port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Time of the most recent check-in.
    #[must_use]
    pub const fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Returns `true` if this member is the `(address, port)` endpoint.
    #[must_use]
    pub fn matches(&self, address: IpAddr, port: u16) -> bool {
        self.address == address && self.port == port
    }

    /// Returns `true` iff `now > last_seen + timeout`.
    #[must_use]
    pub fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }

    /// Records a check-in at `now`. Never moves `last_seen` backwards.
    pub fn refresh(&mut self, now: Instant) {
        self.last_seen = self.last_seen.max(now);
    }

    /// Serializable view without the timestamp.
    #[must_use]
    pub const fn snapshot(&self) -> MemberSnapshot {
        MemberSnapshot {
            address: self.address,
            port: self.port,
        }
    }
}

/// Read-only view of a [`Member`] suitable for responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSnapshot {
    /// Registered address.
    pub address: IpAddr,
    /// Registered port.
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));

    #[test]
    fn fresh_member_is_not_stale() {
        let now = Instant::now();
        let member = Member::new(ADDR, 7777, now);
        assert!(!member.is_stale(now, MEMBER_TIMEOUT));
    }

    #[test]
    fn stale_only_strictly_after_timeout() {
        let start = Instant::now();
        let member = Member::new(ADDR, 7777, start);
        assert!(!member.is_stale(start + MEMBER_TIMEOUT, MEMBER_TIMEOUT));
        assert!(member.is_stale(
            start + MEMBER_TIMEOUT + Duration::from_millis(1),
            MEMBER_TIMEOUT
        ));
    }

    #[test]
    fn now_before_last_seen_is_not_stale() {
        let start = Instant::now();
        let member = Member::new(ADDR, 7777, start + Duration::from_secs(5));
        assert!(!member.is_stale(start, MEMBER_TIMEOUT));
    }

    #[test]
    fn refresh_is_monotonic() {
        let start = Instant::now();
        let later = start + Duration::from_secs(10);
        let mut member = Member::new(ADDR, 7777, later);
        member.refresh(start);
        assert_eq!(member.last_seen(), later);
        member.refresh(later + Duration::from_secs(1));
        assert_eq!(member.last_seen(), later + Duration::from_secs(1));
    }

    #[test]
    fn matches_requires_both_address_and_port() {
        let member = Member::new(ADDR, 7777, Instant::now());
        assert!(member.matches(ADDR, 7777));
        assert!(!member.matches(ADDR, 7778));
        assert!(!member.matches(IpAddr::V4(Ipv4Addr::LOCALHOST), 7777));
    }
}
