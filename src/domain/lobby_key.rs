//! Type-safe, validated lobby key.
//!
//! [`LobbyKey`] is a newtype over `String` that can only be constructed
//! through [`LobbyKey::parse`], so every key reaching the registry already
//! satisfies the charset and length rules.

use std::fmt;

use crate::error::GatewayError;

/// Maximum length of a lobby key in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// Returns `true` for characters permitted in keys and version tags.
#[must_use]
pub const fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Shared coordination key naming a lobby.
///
/// 1 to [`MAX_KEY_LEN`] characters from `[A-Za-z0-9_.-]`, with no `..`
/// sequence. Used as the dictionary key in [`super::LobbyRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LobbyKey(String);

impl LobbyKey {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidLobbyKey`] if the key is empty, longer
    /// than [`MAX_KEY_LEN`], contains a character outside the allowed set,
    /// or contains a `..` traversal sequence.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_KEY_LEN
            && raw.chars().all(is_key_char)
            && !raw.contains("..");
        if valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(GatewayError::InvalidLobbyKey(raw.to_owned()))
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LobbyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
