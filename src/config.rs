//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::domain::SWEEP_INTERVAL;
use crate::rate_limit::RateLimitConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("unknown log format {other:?}"),
        }
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:80`).
    pub listen_addr: SocketAddr,

    /// Honor `X-Forwarded-For` / `X-Real-IP`. Enable only behind a trusted
    /// reverse proxy.
    pub trust_proxy_headers: bool,

    /// Accept registrants with IPv6 addresses.
    pub allow_ipv6: bool,

    /// Token-bucket parameters for admission control.
    pub rate_limit: RateLimitConfig,

    /// Period of the background lobby sweep.
    pub sweep_interval: Duration,

    /// Per-request deadline.
    pub request_timeout: Duration,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            trust_proxy_headers: false,
            allow_ipv6: false,
            rate_limit: RateLimitConfig::default(),
            sweep_interval: SWEEP_INTERVAL,
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 10 * 1024,
            log_format: LogFormat::Pretty,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or cannot be
    /// parsed. Calls `dotenvy::dotenv().ok()` to optionally load a `.env`
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`], or if the resulting configuration fails
    /// [`GatewayConfig::validate`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("LISTEN_ADDR {raw:?} is not a socket address"))?,
            Err(_) => defaults.listen_addr,
        };

        let rate_limit = RateLimitConfig {
            rate: parse_env("RATE_LIMIT_RATE", defaults.rate_limit.rate),
            burst: parse_env("RATE_LIMIT_BURST", defaults.rate_limit.burst),
            interval: Duration::from_secs(parse_env(
                "RATE_LIMIT_INTERVAL_SECS",
                defaults.rate_limit.interval.as_secs(),
            )),
        };

        let config = Self {
            listen_addr,
            trust_proxy_headers: parse_env_bool("TRUST_PROXY_HEADERS", defaults.trust_proxy_headers),
            allow_ipv6: parse_env_bool("ALLOW_IPV6", defaults.allow_ipv6),
            rate_limit,
            sweep_interval: Duration::from_secs(parse_env(
                "SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
            request_timeout: Duration::from_secs(parse_env(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            max_body_bytes: parse_env("MAX_BODY_BYTES", defaults.max_body_bytes),
            log_format: parse_env("LOG_FORMAT", defaults.log_format),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate, burst, or any interval is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rate_limit.rate == 0 {
            bail!("RATE_LIMIT_RATE must be at least 1");
        }
        if self.rate_limit.burst == 0 {
            bail!("RATE_LIMIT_BURST must be at least 1");
        }
        if self.rate_limit.interval.is_zero() {
            bail!("RATE_LIMIT_INTERVAL_SECS must be at least 1");
        }
        if self.sweep_interval.is_zero() {
            bail!("SWEEP_INTERVAL_SECS must be at least 1");
        }
        if self.request_timeout.is_zero() {
            bail!("REQUEST_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr.port(), 80);
        assert!(!config.trust_proxy_headers);
        assert!(!config.allow_ipv6);
        assert_eq!(config.rate_limit.rate, 60);
        assert_eq!(config.rate_limit.burst, 120);
        assert_eq!(config.rate_limit.interval, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.max_body_bytes, 10_240);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = GatewayConfig::default();
        config.rate_limit.burst = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.rate_limit.interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.sweep_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bool_parsing_is_case_insensitive() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 1 "), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn log_format_parsing() {
        assert!(matches!("json".parse::<LogFormat>(), Ok(LogFormat::Json)));
        assert!(matches!("Pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty)));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
