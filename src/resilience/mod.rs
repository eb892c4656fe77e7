//! # Request Throttling
//!
//! Per-client request limiting for the HTTP surface.
//!
//! ## Rate Limiter
//!
//! Two sliding windows (60 seconds and 3600 seconds) are tracked for every
//! client id. A request is rejected when either window is full, with a
//! `retry_after` hint in whole seconds:
//!
//! ```rust
//! use science_builder::resilience::rate_limiter::{RateLimiter, RateLimiterConfig};
//!
//! let limiter = RateLimiter::new(
//!     RateLimiterConfig::new()
//!         .with_per_minute(2)
//!         .with_per_hour(100),
//! );
//!
//! assert!(limiter.check("203.0.113.7").allowed);
//! assert!(limiter.check("203.0.113.7").allowed);
//!
//! let decision = limiter.check("203.0.113.7");
//! assert!(!decision.allowed);
//! assert!(decision.retry_after.unwrap() > 0);
//! ```

pub mod rate_limiter;

pub use rate_limiter::{ClientUsage, RateDecision, RateLimiter, RateLimiterConfig, UNKNOWN_CLIENT};
