//! # Response Caching Module
//!
//! In-process TTL caches that keep repeated AI generations and chart renders
//! from hitting providers or the rasteriser again.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TtlCache`] | Bounded map with per-entry expiry and FIFO capacity eviction |
//! | [`CallKey`] | Deterministic key builder from a call's name and arguments |
//! | [`CacheKey`] | SHA-256 hex key |
//! | [`CacheStats`] | Size and hit/miss counters for monitoring endpoints |
//!
//! ## Example
//!
//! ```rust
//! use science_builder::cache::{CallKey, TtlCache};
//! use std::time::Duration;
//!
//! let cache: TtlCache<String> = TtlCache::new("ai_responses", Duration::from_secs(3600), 500);
//! let key = CallKey::new("generate_idea").arg("biology").arg("6-8").finish();
//!
//! assert!(cache.get(&key).is_none());
//! cache.set(&key, "Plant growth under coloured light".to_string());
//! assert!(cache.get(&key).is_some());
//! ```
//!
//! State is process-local; several server processes each keep their own view.

mod key;
mod ttl;

pub use key::{CacheKey, CallKey};
pub use ttl::TtlCache;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage with one decimal, e.g. `"66.7%"`.
    pub hit_rate: String,
    pub total_requests: u64,
}

impl CacheStats {
    pub fn new(size: usize, max_size: usize, hits: u64, misses: u64) -> Self {
        let total_requests = hits + misses;
        Self {
            size,
            max_size,
            hits,
            misses,
            hit_rate: format!("{:.1}%", hit_ratio(hits, total_requests) * 100.0),
            total_requests,
        }
    }

    pub fn hit_ratio(&self) -> f64 {
        hit_ratio(self.hits, self.total_requests)
    }
}

fn hit_ratio(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
