//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the request adapter. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. The lobby core itself never fails once its inputs are
//! validated, so every variant here originates at the HTTP boundary.

use std::net::IpAddr;

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "invalid port: 70000",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`GatewayError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Not Found       | 404 Not Found             |
/// | 3000–3999 | Server          | 500 Internal Server Error |
/// | 429       | Admission       | 429 Too Many Requests     |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Lobby key failed charset, length, or traversal checks.
    #[error("invalid lobby key: {0}")]
    InvalidLobbyKey(String),

    /// Port segment is not an integer in `0..=65535`.
    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// Protocol version tag failed validation.
    #[error("invalid protocol version: {0}")]
    InvalidVersion(String),

    /// Registrant address family is not accepted (IPv6 when disabled).
    #[error("unsupported address: {0} (IPv6 registrants are disabled)")]
    UnsupportedAddress(IpAddr),

    /// No lobby is registered under the given key.
    #[error("lobby not found: {0}")]
    LobbyNotFound(String),

    /// Client exceeded rate limit.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidLobbyKey(_) => 1001,
            Self::InvalidPort(_) => 1002,
            Self::InvalidVersion(_) => 1003,
            Self::UnsupportedAddress(_) => 1004,
            Self::LobbyNotFound(_) => 2001,
            Self::RateLimited { .. } => 429,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidLobbyKey(_)
            | Self::InvalidPort(_)
            | Self::InvalidVersion(_)
            | Self::UnsupportedAddress(_) => StatusCode::BAD_REQUEST,
            Self::LobbyNotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, code = self.error_code(), "request rejected");
        }

        let retry_after = match &self {
            Self::RateLimited { retry_after_ms } => {
                Some(HeaderValue::from(retry_after_ms.div_ceil(1000).max(1)))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        if let Some(value) = retry_after {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn validation_errors_are_bad_request() {
        let errors = [
            GatewayError::InvalidLobbyKey("a b".to_string()),
            GatewayError::InvalidPort("70000".to_string()),
            GatewayError::InvalidVersion("v 1".to_string()),
            GatewayError::UnsupportedAddress(IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 1])),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!((1000..2000).contains(&err.error_code()));
        }
    }

    #[test]
    fn rate_limited_sets_retry_after_seconds() {
        let response = GatewayError::RateLimited {
            retry_after_ms: 1500,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let Some(value) = response.headers().get(RETRY_AFTER) else {
            panic!("missing Retry-After header");
        };
        assert_eq!(value, "2");
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let Ok(mut out) = self.0.lock() else {
                return Err(io::Error::other("capture poisoned"));
            };
            out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rejected_input_logs_at_warn() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _ = GatewayError::InvalidPort("70000".to_string()).into_response();
        });

        let Ok(out) = capture.0.lock() else {
            panic!("capture poisoned");
        };
        let logged = String::from_utf8_lossy(&out);
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("request rejected"), "{logged}");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = GatewayError::LobbyNotFound("arena-1".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "lobby not found: arena-1");
    }
}
