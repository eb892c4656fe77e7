use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client id used when neither a forwarded-for header nor a peer address is known.
///
/// Every unidentified caller shares this one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Idle clients are swept from the table once per this many checks.
const SWEEP_EVERY: u64 = 256;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub requests_per_minute: usize,
    pub requests_per_hour: usize,
}

impl RateLimiterConfig {
    pub fn new() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1000,
        }
    }

    pub fn with_per_minute(mut self, limit: usize) -> Self {
        self.requests_per_minute = limit;
        self
    }

    pub fn with_per_hour(mut self, limit: usize) -> Self {
        self.requests_per_hour = limit;
        self
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Whole seconds until a retry can succeed; only set on rejection.
    pub retry_after: Option<u64>,
}

impl RateDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }

    fn reject(retry_after: u64) -> Self {
        Self {
            allowed: false,
            retry_after: Some(retry_after),
        }
    }
}

/// Requests currently counted against a client in each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientUsage {
    pub minute: usize,
    pub hour: usize,
}

#[derive(Debug, Default)]
struct WindowLog {
    stamps: VecDeque<Instant>,
}

impl WindowLog {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.stamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Floor of the time until the oldest stamp leaves the window, plus one second.
    fn retry_after(&self, now: Instant, window: Duration) -> u64 {
        let remaining = self
            .stamps
            .front()
            .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or_default();
        remaining.as_secs() + 1
    }
}

#[derive(Debug, Default)]
struct ClientWindows {
    minute: WindowLog,
    hour: WindowLog,
}

impl ClientWindows {
    fn prune(&mut self, now: Instant) {
        self.minute.prune(now, MINUTE);
        self.hour.prune(now, HOUR);
    }

    /// The hour log holds every minute stamp, so an empty hour log means idle.
    fn is_idle(&self) -> bool {
        self.hour.len() == 0
    }
}

/// Per-client sliding-window limiter with a minute and an hour window.
///
/// Each client keeps a log of request instants per window; entries older
/// than the window are dropped lazily on every access, and clients with no
/// request left in either window are removed periodically. Counters live in
/// this process only, so several server processes each enforce their own quota.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    clients: Mutex<HashMap<String, ClientWindows>>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self {
            cfg,
            clients: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.cfg
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ClientWindows>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn check(&self, client_id: &str) -> RateDecision {
        self.check_at(client_id, Instant::now())
    }

    /// Check and, if allowed, record a request made at `now`.
    pub fn check_at(&self, client_id: &str, now: Instant) -> RateDecision {
        let mut clients = self.lock();
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            Self::sweep(&mut clients, now);
        }
        let windows = clients.entry(client_id.to_string()).or_default();
        windows.prune(now);

        let minute_count = windows.minute.len();
        if minute_count >= self.cfg.requests_per_minute {
            let retry_after = windows.minute.retry_after(now, MINUTE);
            warn!(
                client_id,
                count = minute_count,
                limit = self.cfg.requests_per_minute,
                retry_after,
                "Rate limit exceeded (per minute)"
            );
            return RateDecision::reject(retry_after);
        }

        let hour_count = windows.hour.len();
        if hour_count >= self.cfg.requests_per_hour {
            let retry_after = windows.hour.retry_after(now, HOUR);
            warn!(
                client_id,
                count = hour_count,
                limit = self.cfg.requests_per_hour,
                retry_after,
                "Rate limit exceeded (per hour)"
            );
            return RateDecision::reject(retry_after);
        }

        windows.minute.stamps.push_back(now);
        windows.hour.stamps.push_back(now);
        RateDecision::allow()
    }

    pub fn usage(&self, client_id: &str) -> ClientUsage {
        self.usage_at(client_id, Instant::now())
    }

    pub fn usage_at(&self, client_id: &str, now: Instant) -> ClientUsage {
        let mut clients = self.lock();
        let usage = match clients.get_mut(client_id) {
            Some(windows) => {
                windows.prune(now);
                ClientUsage {
                    minute: windows.minute.len(),
                    hour: windows.hour.len(),
                }
            }
            None => return ClientUsage { minute: 0, hour: 0 },
        };
        if usage.hour == 0 {
            clients.remove(client_id);
        }
        usage
    }

    /// Drop every client with no request left in either window.
    ///
    /// Returns the number of clients removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        Self::sweep(&mut self.lock(), now)
    }

    /// Number of clients currently holding window state.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    fn sweep(clients: &mut HashMap<String, ClientWindows>, now: Instant) -> usize {
        let before = clients.len();
        clients.retain(|_, windows| {
            windows.prune(now);
            !windows.is_idle()
        });
        let removed = before - clients.len();
        if removed > 0 {
            debug!(removed, remaining = clients.len(), "Swept idle rate-limit clients");
        }
        removed
    }

    pub fn remaining(&self, usage: ClientUsage) -> ClientUsage {
        ClientUsage {
            minute: self.cfg.requests_per_minute.saturating_sub(usage.minute),
            hour: self.cfg.requests_per_hour.saturating_sub(usage.hour),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: usize, per_hour: usize) -> RateLimiter {
        RateLimiter::new(
            RateLimiterConfig::new()
                .with_per_minute(per_minute)
                .with_per_hour(per_hour),
        )
    }

    #[test]
    fn test_config_defaults() {
        let cfg = RateLimiterConfig::default();
        assert_eq!(cfg.requests_per_minute, 60);
        assert_eq!(cfg.requests_per_hour, 1000);
    }

    #[test]
    fn test_minute_window_rejects_then_recovers() {
        let limiter = limiter(3, 100);
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(limiter.check_at("1.2.3.4", t0 + Duration::from_secs(i)).allowed);
        }

        let rejected = limiter.check_at("1.2.3.4", t0 + Duration::from_secs(10));
        assert!(!rejected.allowed);
        // Oldest stamp (t0) leaves the window at t0+60: 50s away, floored, plus one.
        assert_eq!(rejected.retry_after, Some(51));

        let retry_at = t0 + Duration::from_secs(10 + 51);
        assert!(limiter.check_at("1.2.3.4", retry_at).allowed);
    }

    #[test]
    fn test_fractional_wait_is_floored_plus_one() {
        let limiter = limiter(1, 100);
        let t0 = Instant::now();
        assert!(limiter.check_at("c", t0).allowed);

        let decision = limiter.check_at("c", t0 + Duration::from_millis(59_500));
        assert_eq!(decision.retry_after, Some(1));
    }

    #[test]
    fn test_rejected_requests_are_not_counted() {
        let limiter = limiter(1, 100);
        let t0 = Instant::now();
        assert!(limiter.check_at("c", t0).allowed);
        for s in 1..5 {
            assert!(!limiter.check_at("c", t0 + Duration::from_secs(s)).allowed);
        }
        assert_eq!(limiter.usage_at("c", t0 + Duration::from_secs(5)).minute, 1);
    }

    #[test]
    fn test_hour_window() {
        let limiter = limiter(100, 2);
        let t0 = Instant::now();
        assert!(limiter.check_at("c", t0).allowed);
        assert!(limiter.check_at("c", t0 + Duration::from_secs(120)).allowed);

        let decision = limiter.check_at("c", t0 + Duration::from_secs(240));
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after, Some(3600 - 240 + 1));

        assert!(limiter.check_at("c", t0 + Duration::from_secs(3600)).allowed);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 10);
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0).allowed);
        assert!(!limiter.check_at("a", t0).allowed);
        assert!(limiter.check_at("b", t0).allowed);
    }

    #[test]
    fn test_unknown_clients_share_one_bucket() {
        let limiter = limiter(1, 10);
        assert!(limiter.check(UNKNOWN_CLIENT).allowed);
        assert!(!limiter.check(UNKNOWN_CLIENT).allowed);
    }

    #[test]
    fn test_usage_and_remaining() {
        let limiter = limiter(5, 10);
        let t0 = Instant::now();
        limiter.check_at("c", t0);
        limiter.check_at("c", t0);

        let usage = limiter.usage_at("c", t0);
        assert_eq!(usage, ClientUsage { minute: 2, hour: 2 });
        assert_eq!(limiter.remaining(usage), ClientUsage { minute: 3, hour: 8 });

        let later = limiter.usage_at("c", t0 + Duration::from_secs(61));
        assert_eq!(later, ClientUsage { minute: 0, hour: 2 });
        assert_eq!(limiter.usage("nobody"), ClientUsage { minute: 0, hour: 0 });
    }

    #[test]
    fn test_idle_clients_are_swept() {
        let limiter = limiter(10, 100);
        let t0 = Instant::now();
        for i in 0..50 {
            limiter.check_at(&format!("10.0.0.{}", i), t0);
        }
        assert!(limiter.check_at("late", t0 + Duration::from_secs(1800)).allowed);
        assert_eq!(limiter.tracked_clients(), 51);

        // Still inside the hour window: nothing to drop.
        assert_eq!(limiter.sweep_at(t0 + Duration::from_secs(3599)), 0);
        assert_eq!(limiter.sweep_at(t0 + HOUR), 50);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_periodic_sweep_bounds_distinct_clients() {
        let limiter = limiter(1000, 1000);
        let t0 = Instant::now();
        for i in 0..SWEEP_EVERY {
            limiter.check_at(&format!("spoofed-{}", i), t0);
        }
        assert_eq!(limiter.tracked_clients() as u64, SWEEP_EVERY);

        let later = t0 + HOUR;
        for _ in 0..SWEEP_EVERY {
            limiter.check_at("steady", later);
        }
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_usage_forgets_idle_client() {
        let limiter = limiter(5, 10);
        let t0 = Instant::now();
        limiter.check_at("c", t0);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(
            limiter.usage_at("c", t0 + HOUR),
            ClientUsage { minute: 0, hour: 0 }
        );
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
