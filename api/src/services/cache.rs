//! Short-lived response cache for generation results.
//!
//! A retried or double-submitted request with the same idempotency key (or
//! the same validated input) is answered from here instead of calling the
//! provider again.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&self, key: &str, value: Value, ttl: Duration);
    /// Drop expired entries; returns how many were removed
    fn sweep(&self) -> usize;
}

/// Cache key for one generation surface, always scoped by the SHA-256 of the
/// validated input. An idempotency key narrows it further to one client's
/// logical call, so a reused key with different input never hits.
pub fn cache_key<T: Serialize>(
    surface: &str,
    client: &str,
    idempotency_key: Option<&str>,
    input: &T,
) -> String {
    let bytes = serde_json::to_vec(input).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    match idempotency_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => format!("{surface}:idem:{client}:{key}:{hex}"),
        None => format!("{surface}:input:{hex}"),
    }
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResponseCache for MemoryResponseCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn idempotency_key_is_scoped_by_client_and_input() {
        let input = json!({"niche": "travel"});
        let keyed = cache_key("short", "1.2.3.4", Some("abc"), &input);
        assert!(keyed.starts_with("short:idem:1.2.3.4:abc:"));
        assert_eq!(keyed, cache_key("short", "1.2.3.4", Some(" abc "), &input));
        assert_ne!(keyed, cache_key("short", "5.6.7.8", Some("abc"), &input));
        assert_ne!(keyed, cache_key("short", "1.2.3.4", Some("abc"), &json!({"niche": "food"})));

        let hashed = cache_key("short", "1.2.3.4", None, &input);
        assert!(hashed.starts_with("short:input:"));
        assert_eq!(hashed, cache_key("short", "1.2.3.4", Some("  "), &input));
        assert_eq!(hashed, cache_key("short", "5.6.7.8", None, &input));
        assert_ne!(hashed, cache_key("long", "1.2.3.4", None, &input));
        assert_ne!(hashed, cache_key("short", "1.2.3.4", None, &json!({"niche": "food"})));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryResponseCache::new();
        cache.put("k", json!({"id": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"id": 1})));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired() {
        let cache = MemoryResponseCache::new();
        cache.put("short", json!(1), Duration::from_secs(60));
        cache.put("long", json!(2), Duration::from_secs(120));
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("long"), Some(json!(2)));
    }
}
