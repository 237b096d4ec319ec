//! Sharing of identical in-flight requests.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

type InFlight<T> = Shared<BoxFuture<'static, T>>;

/// Concurrent callers with the same key await one underlying future
pub struct Dedup<T: Clone> {
    in_flight: Arc<Mutex<HashMap<String, InFlight<T>>>>,
}

impl<T: Clone> Default for Dedup<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Drops the map entry when the leading caller finishes or is cancelled
struct Release<T: Clone> {
    in_flight: Arc<Mutex<HashMap<String, InFlight<T>>>>,
    key: String,
}

impl<T: Clone> Drop for Release<T> {
    fn drop(&mut self) {
        let mut map = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&self.key);
    }
}

impl<T> Dedup<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make()` under `key`, or join the run already in flight
    pub async fn run<F, Fut>(&self, key: String, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (shared, release) = {
            let mut map = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match map.get(&key) {
                Some(existing) => {
                    tracing::debug!(key = %key, "joining in-flight request");
                    (existing.clone(), None)
                }
                None => {
                    let shared = make().boxed().shared();
                    map.insert(key.clone(), shared.clone());
                    let release = Release {
                        in_flight: self.in_flight.clone(),
                        key,
                    };
                    (shared, Some(release))
                }
            }
        };

        let output = shared.await;
        drop(release);
        output
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn identical_concurrent_requests_share_one_call() {
        let dedup: Dedup<u32> = Dedup::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let call = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        };

        let (a, b) = tokio::join!(
            dedup.run("POST /generate {}".into(), || call(calls.clone())),
            dedup.run("POST /generate {}".into(), || call(calls.clone())),
        );

        assert_eq!((a, b), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dedup.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_run_separately() {
        let dedup: Dedup<&'static str> = Dedup::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = |value: &'static str| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                value
            }
        };

        let (a, b) = tokio::join!(
            dedup.run("a".into(), || counted("a")),
            dedup.run("b".into(), || counted("b")),
        );
        assert_eq!((a, b), ("a", "b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn later_request_after_completion_runs_again() {
        let dedup: Dedup<u32> = Dedup::new();
        let first = dedup.run("k".into(), || async { 1 }).await;
        let second = dedup.run("k".into(), || async { 2 }).await;
        assert_eq!((first, second), (1, 2));
    }
}
