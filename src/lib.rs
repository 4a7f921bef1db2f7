//! # lobby-gateway
//!
//! Rendezvous service for peer-to-peer sessions. Peers register their
//! reachable address and port under a shared lobby key, poll the same key
//! to discover the other registrants, and age out when they stop checking
//! in.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── Middleware (api/, rate_limit/)
//!     │     request id → trace → RateLimiter → CORS / security headers
//!     │
//!     ├── REST Handlers (api/handlers)
//!     │
//!     ├── LobbyService (service/)
//!     │
//!     └── LobbyRegistry → Lobby → Member (domain/)
//!           └── background sweep
//! ```
//!
//! State is memory-resident and process-lifetime only.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod rate_limit;
pub mod service;
