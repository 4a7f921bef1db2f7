//! Request validation: turns raw path, query and peer data into a
//! registration request the lobby core can act on.

use std::net::IpAddr;

use crate::domain::LobbyKey;
use crate::domain::lobby_key::{MAX_KEY_LEN, is_key_char};
use crate::error::GatewayError;

/// Version tag assigned to lobbies created through the legacy routes.
pub const LEGACY_VERSION: &str = "v0.0.0";

/// A validated `(key, port, address)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    /// Target lobby.
    pub key: LobbyKey,
    /// Registrant port from the path.
    pub port: u16,
    /// Registrant address derived from the connection.
    pub address: IpAddr,
}

impl RegistrationRequest {
    /// Validates the raw path segments and the resolved client address.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidLobbyKey`], [`GatewayError::InvalidPort`]
    /// or [`GatewayError::UnsupportedAddress`].
    pub fn parse(
        raw_key: &str,
        raw_port: &str,
        client: IpAddr,
        allow_ipv6: bool,
    ) -> Result<Self, GatewayError> {
        let key = LobbyKey::parse(raw_key)?;
        let port = parse_port(raw_port)?;
        let address = registrant_address(client, allow_ipv6)?;
        Ok(Self { key, port, address })
    }
}

/// Parses a decimal port in `0..=65535`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidPort`] for anything else.
pub fn parse_port(raw: &str) -> Result<u16, GatewayError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::InvalidPort(raw.to_owned()));
    }
    raw.parse()
        .map_err(|_| GatewayError::InvalidPort(raw.to_owned()))
}

/// Validates an optional protocol version tag; absent means empty.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidVersion`] if the tag is longer than
/// [`MAX_KEY_LEN`] or uses characters outside the key charset.
pub fn parse_version(raw: Option<&str>) -> Result<String, GatewayError> {
    let version = raw.unwrap_or_default();
    if version.len() > MAX_KEY_LEN || !version.chars().all(is_key_char) {
        return Err(GatewayError::InvalidVersion(version.to_owned()));
    }
    Ok(version.to_owned())
}

/// Applies the address-family policy to the resolved client address.
///
/// # Errors
///
/// Returns [`GatewayError::UnsupportedAddress`] for IPv6 addresses unless
/// `allow_ipv6` is set.
pub fn registrant_address(client: IpAddr, allow_ipv6: bool) -> Result<IpAddr, GatewayError> {
    let client = client.to_canonical();
    if client.is_ipv6() && !allow_ipv6 {
        return Err(GatewayError::UnsupportedAddress(client));
    }
    Ok(client)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const V4: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5));
    const V6: IpAddr = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));

    #[test]
    fn port_range() {
        for (raw, expected) in [("80", 80), ("443", 443), ("8080", 8080), ("0", 0), ("65535", 65535)] {
            let Ok(port) = parse_port(raw) else {
                panic!("{raw} should be valid");
            };
            assert_eq!(port, expected);
        }
        for raw in ["-1", "65536", "", "+80", "80a", "port"] {
            assert!(
                matches!(parse_port(raw), Err(GatewayError::InvalidPort(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn version_defaults_to_empty() {
        let Ok(version) = parse_version(None) else {
            panic!("absent version is valid");
        };
        assert!(version.is_empty());
    }

    #[test]
    fn version_uses_key_charset() {
        assert!(parse_version(Some("v1.2.3-beta_4")).is_ok());
        assert!(parse_version(Some("v 1")).is_err());
        assert!(parse_version(Some(&"v".repeat(MAX_KEY_LEN + 1))).is_err());
    }

    #[test]
    fn ipv6_registrants_follow_policy() {
        assert!(matches!(
            registrant_address(V6, false),
            Err(GatewayError::UnsupportedAddress(_))
        ));
        assert!(matches!(registrant_address(V6, true), Ok(addr) if addr == V6));
        assert!(matches!(registrant_address(V4, false), Ok(addr) if addr == V4));
    }

    #[test]
    fn mapped_ipv6_registrant_is_ipv4() {
        let mapped = IpAddr::V6(Ipv4Addr::new(203, 0, 113, 5).to_ipv6_mapped());
        assert!(matches!(registrant_address(mapped, false), Ok(addr) if addr == V4));
    }

    #[test]
    fn request_parse_reports_first_failure() {
        let Ok(request) = RegistrationRequest::parse("arena-1", "7777", V4, false) else {
            panic!("valid request");
        };
        assert_eq!(request.key.as_str(), "arena-1");
        assert_eq!(request.port, 7777);
        assert_eq!(request.address, V4);

        assert!(matches!(
            RegistrationRequest::parse("bad key", "7777", V4, false),
            Err(GatewayError::InvalidLobbyKey(_))
        ));
        assert!(matches!(
            RegistrationRequest::parse("arena-1", "99999", V4, false),
            Err(GatewayError::InvalidPort(_))
        ));
    }
}
