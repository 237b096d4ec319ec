//! Short-lived memo of successful generation results.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const SHORT_FORM_TTL: Duration = Duration::from_secs(60);
pub const LONG_FORM_TTL: Duration = Duration::from_secs(120);

pub struct TtlCache<V: Clone> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for an input: its serialized JSON
    pub fn key_for<T: Serialize>(input: &T) -> String {
        serde_json::to_string(input).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let (stored_at, value) = entries.get(key)?;
        if stored_at.elapsed() < self.ttl {
            return Some(value.clone());
        }
        entries.remove(key);
        None
    }

    pub fn put(&self, key: String, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), value));
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_live_for_the_ttl() {
        let cache = TtlCache::new(SHORT_FORM_TTL);
        cache.put("k".into(), 42);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k"), Some(42));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn keys_follow_serialized_input() {
        #[derive(Serialize)]
        struct Input {
            niche: &'static str,
        }
        assert_eq!(TtlCache::<u8>::key_for(&Input { niche: "yoga" }), r#"{"niche":"yoga"}"#);
    }
}
