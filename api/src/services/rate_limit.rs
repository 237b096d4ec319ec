//! Per-client rate limiting for the generation endpoints
//!
//! Fixed window counters: the first request from a client opens a window,
//! later requests count against it until it expires. Expired windows are
//! reset lazily on access and swept periodically to bound memory.
//!
//! Counters live in one process. Several instances behind a load balancer
//! each enforce their own limit unless a shared `CounterStore` is plugged in.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Rate limiter configuration
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u32,
    /// Epoch ms at which the window ends
    pub reset_at_ms: i64,
}

/// Storage for window counters, keyed by client id
pub trait CounterStore: Send + Sync {
    fn get(&self, id: &str) -> Option<WindowState>;
    /// Apply `f` to the current state atomically and store the result
    fn update(&self, id: &str, f: &mut dyn FnMut(Option<WindowState>) -> WindowState)
    -> WindowState;
    /// Drop entries whose window ended at or before `now_ms`; returns how many
    fn remove_expired(&self, now_ms: i64) -> usize;
}

#[derive(Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl MemoryCounterStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WindowState>> {
        // A poisoned map still holds valid counters
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CounterStore for MemoryCounterStore {
    fn get(&self, id: &str) -> Option<WindowState> {
        self.lock().get(id).copied()
    }

    fn update(
        &self,
        id: &str,
        f: &mut dyn FnMut(Option<WindowState>) -> WindowState,
    ) -> WindowState {
        let mut windows = self.lock();
        let next = f(windows.get(id).copied());
        windows.insert(id.to_string(), next);
        next
    }

    fn remove_expired(&self, now_ms: i64) -> usize {
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, w| w.reset_at_ms > now_ms);
        before - windows.len()
    }
}

/// Fixed window limiter over a pluggable counter store
pub struct FixedWindowLimiter<S: CounterStore = MemoryCounterStore> {
    config: RateLimitConfig,
    store: S,
}

impl FixedWindowLimiter<MemoryCounterStore> {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, MemoryCounterStore::default())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl<S: CounterStore> FixedWindowLimiter<S> {
    pub fn with_store(config: RateLimitConfig, store: S) -> Self {
        Self { config, store }
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.config.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// Count a request for `id`. Returns false when the window is exhausted.
    pub fn is_allowed(&self, id: &str) -> bool {
        self.is_allowed_at(id, now_ms())
    }

    pub fn is_allowed_at(&self, id: &str, now_ms: i64) -> bool {
        let max = self.config.max_requests;
        let window_ms = self.window_ms();
        let mut allowed = false;
        self.store.update(id, &mut |current| match current {
            Some(w) if w.reset_at_ms > now_ms => {
                if w.count >= max {
                    allowed = false;
                    w
                } else {
                    allowed = true;
                    WindowState {
                        count: w.count + 1,
                        reset_at_ms: w.reset_at_ms,
                    }
                }
            }
            _ => {
                allowed = max > 0;
                WindowState {
                    count: 1,
                    reset_at_ms: now_ms.saturating_add(window_ms),
                }
            }
        });
        allowed
    }

    pub fn remaining(&self, id: &str) -> u32 {
        self.remaining_at(id, now_ms())
    }

    pub fn remaining_at(&self, id: &str, now_ms: i64) -> u32 {
        match self.store.get(id) {
            Some(w) if w.reset_at_ms > now_ms => self.config.max_requests.saturating_sub(w.count),
            _ => self.config.max_requests,
        }
    }

    /// Epoch ms when the current window ends; a fresh window if none is open
    pub fn reset_time(&self, id: &str) -> i64 {
        self.reset_time_at(id, now_ms())
    }

    pub fn reset_time_at(&self, id: &str, now_ms: i64) -> i64 {
        match self.store.get(id) {
            Some(w) if w.reset_at_ms > now_ms => w.reset_at_ms,
            _ => now_ms.saturating_add(self.window_ms()),
        }
    }

    /// Whole seconds until the window resets, rounded up
    pub fn retry_after_secs(&self, id: &str) -> u64 {
        self.retry_after_secs_at(id, now_ms())
    }

    pub fn retry_after_secs_at(&self, id: &str, now_ms: i64) -> u64 {
        let wait_ms = (self.reset_time_at(id, now_ms) - now_ms).max(0) as u64;
        wait_ms.div_ceil(1000)
    }

    /// Remove expired windows. Call this periodically to prevent memory growth.
    pub fn cleanup(&self) -> usize {
        self.store.remove_expired(now_ms())
    }

    pub fn cleanup_at(&self, now_ms: i64) -> usize {
        self.store.remove_expired(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests: 10,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn eleventh_request_in_a_window_is_rejected() {
        let limiter = limiter();
        let start = 1_000_000;
        for i in 0..10 {
            assert!(limiter.is_allowed_at("1.2.3.4", start + i * 1000), "request {i}");
        }
        assert!(!limiter.is_allowed_at("1.2.3.4", start + 30_000));
        assert_eq!(limiter.remaining_at("1.2.3.4", start + 30_000), 0);

        let reset = limiter.reset_time_at("1.2.3.4", start + 30_000);
        assert!(reset > start + 30_000 && reset <= start + 30_000 + 60_000);
        assert_eq!(limiter.retry_after_secs_at("1.2.3.4", start + 30_000), 30);
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = limiter();
        for _ in 0..10 {
            assert!(limiter.is_allowed_at("a", 0));
        }
        assert!(!limiter.is_allowed_at("a", 1));
        assert!(limiter.is_allowed_at("b", 1));
        assert_eq!(limiter.remaining_at("b", 1), 9);
    }

    #[test]
    fn expired_window_resets_lazily() {
        let limiter = limiter();
        for _ in 0..11 {
            limiter.is_allowed_at("a", 0);
        }
        assert!(limiter.is_allowed_at("a", 60_000));
        assert_eq!(limiter.remaining_at("a", 60_000), 9);
        assert_eq!(limiter.reset_time_at("a", 60_000), 120_000);
    }

    #[test]
    fn retry_after_rounds_up() {
        let limiter = limiter();
        limiter.is_allowed_at("a", 0);
        assert_eq!(limiter.retry_after_secs_at("a", 59_001), 1);
        assert_eq!(limiter.retry_after_secs_at("a", 1), 60);
    }

    #[test]
    fn cleanup_drops_only_expired_windows() {
        let limiter = limiter();
        limiter.is_allowed_at("old", 0);
        limiter.is_allowed_at("new", 50_000);
        assert_eq!(limiter.cleanup_at(70_000), 1);
        assert_eq!(limiter.remaining_at("new", 70_000), 9);
    }
}
