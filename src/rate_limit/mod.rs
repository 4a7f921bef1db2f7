//! Admission control: per-client token buckets and the middleware that
//! applies them.
//!
//! The limiter's state is logically independent of the lobby registry and
//! shares no locks with it.

pub mod client_ip;
pub mod limiter;
pub mod middleware;

pub use client_ip::{ClientIp, ClientIpPolicy};
pub use limiter::{RateLimitConfig, RateLimiter};
