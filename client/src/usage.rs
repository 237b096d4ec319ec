//! Per-surface pacing of generation calls plus lightweight usage analytics.
//!
//! Tasks run strictly in arrival order, one at a time, at least
//! `min_interval` apart and never inside a failure cooldown. The last dispatch
//! and the end of any cooldown are persisted, so a restarted client keeps
//! pacing. Counts are informational; nothing here refuses a request.

use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::store::KeyValueStore;

const STORAGE_PREFIX: &str = "sb_";
const ANALYTICS_LABEL_MAX: usize = 80;

/// Estimated provider cost per generation in USD
pub const ESTIMATED_COST_USD: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Short,
    Long,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Short => "short",
            Surface::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UsageConfig {
    pub min_interval: Duration,
    pub failure_cooldown: Duration,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(3),
            failure_cooldown: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub started_at: DateTime<Utc>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    /// Local `YYYY-MM-DD`
    pub date: String,
    pub total_generations: u32,
    pub niches: BTreeMap<String, u32>,
    pub tones: BTreeMap<String, u32>,
    pub costs_usd: f64,
}

impl DailyMetrics {
    fn empty(date: String) -> Self {
        Self {
            date,
            total_generations: 0,
            niches: BTreeMap::new(),
            tones: BTreeMap::new(),
            costs_usd: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationAnalytics {
    pub niche: Option<String>,
    pub tone: Option<String>,
    pub estimated_cost_usd: Option<f64>,
}

#[derive(Default)]
struct Pacing {
    last_dispatch: Option<Instant>,
    cooldown_until: Option<Instant>,
}

pub struct UsageController {
    surface: Surface,
    config: UsageConfig,
    store: Arc<dyn KeyValueStore>,
    pacing: Mutex<Pacing>,
    /// Wall-clock milliseconds at `Instant`, for persisting pacing deadlines
    epoch: (Instant, i64),
    /// tokio's mutex hands out the lock in request order
    queue: tokio::sync::Mutex<()>,
}

impl UsageController {
    pub fn new(surface: Surface, config: UsageConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            surface,
            config,
            store,
            pacing: Mutex::new(Pacing::default()),
            epoch: (Instant::now(), Utc::now().timestamp_millis()),
            queue: tokio::sync::Mutex::new(()),
        }
    }

    fn storage_key(&self, name: &str) -> String {
        format!("{STORAGE_PREFIX}{name}:{}", self.surface.as_str())
    }

    fn pacing(&self) -> std::sync::MutexGuard<'_, Pacing> {
        self.pacing.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn epoch_ms(&self, at: Instant) -> i64 {
        let (anchor, anchor_ms) = self.epoch;
        let elapsed = at.saturating_duration_since(anchor).as_millis();
        anchor_ms.saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    /// Time from `now` until the persisted epoch-ms deadline at `name`
    fn persisted_wait(&self, name: &str, offset: Duration, now: Instant) -> Duration {
        let Some(at) = self.read::<i64>(&self.storage_key(name)) else {
            return Duration::ZERO;
        };
        let offset_ms = i64::try_from(offset.as_millis()).unwrap_or(i64::MAX);
        let remaining = at.saturating_add(offset_ms).saturating_sub(self.epoch_ms(now));
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }

    fn cooldown_wait(&self, now: Instant) -> Duration {
        let in_memory = self
            .pacing()
            .cooldown_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default();
        in_memory.max(self.persisted_wait("next_available_at", Duration::ZERO, now))
    }

    /// How long the next dispatch must wait from `now`
    fn wait_before_dispatch(&self, now: Instant) -> Duration {
        let interval_wait = self
            .pacing()
            .last_dispatch
            .map(|last| (last + self.config.min_interval).saturating_duration_since(now))
            .unwrap_or_default()
            .max(self.persisted_wait("last_request_at", self.config.min_interval, now));
        interval_wait.max(self.cooldown_wait(now))
    }

    /// Run `task` after every earlier task has finished and the pacing rules
    /// allow it
    pub async fn enqueue<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _turn = self.queue.lock().await;
        let wait = self.wait_before_dispatch(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(surface = self.surface.as_str(), wait_ms = wait.as_millis() as u64, "pacing generation");
            tokio::time::sleep(wait).await;
        }
        let dispatched = Instant::now();
        self.pacing().last_dispatch = Some(dispatched);
        self.write(&self.storage_key("last_request_at"), &self.epoch_ms(dispatched));
        task.await
    }

    pub fn record_success(&self, analytics: &GenerationAnalytics) {
        let mut session = self.session_info(u32::MAX).0;
        session.count += 1;
        self.write(&self.storage_key("session_info"), &session);

        let mut metrics = self.daily_metrics();
        metrics.total_generations += 1;
        if let Some(niche) = analytics.niche.as_deref().map(label) {
            *metrics.niches.entry(niche).or_default() += 1;
        }
        if let Some(tone) = analytics.tone.as_deref().map(label) {
            *metrics.tones.entry(tone).or_default() += 1;
        }
        if let Some(cost) = analytics.estimated_cost_usd.filter(|c| c.is_finite()) {
            metrics.costs_usd += cost.max(0.0);
        }
        self.write(&metrics_key(&metrics.date), &metrics);
    }

    pub fn record_failure(&self) {
        let until = Instant::now() + self.config.failure_cooldown;
        self.pacing().cooldown_until = Some(until);
        self.write(&self.storage_key("next_available_at"), &self.epoch_ms(until));
    }

    /// Whole seconds left in the failure cooldown, rounded up
    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_wait(Instant::now()).as_millis().div_ceil(1000) as u64
    }

    /// Current 24 h session and how many of `limit` remain in it
    pub fn session_info(&self, limit: u32) -> (SessionInfo, u32) {
        let key = self.storage_key("session_info");
        let now = Utc::now();
        let info = self
            .read::<SessionInfo>(&key)
            .filter(|s| now - s.started_at <= ChronoDuration::hours(24))
            .unwrap_or_else(|| {
                let fresh = SessionInfo {
                    started_at: now,
                    count: 0,
                };
                self.write(&key, &fresh);
                fresh
            });
        let remaining = limit.saturating_sub(info.count);
        (info, remaining)
    }

    pub fn daily_metrics(&self) -> DailyMetrics {
        let today = Local::now().format("%Y-%m-%d").to_string();
        self.read::<DailyMetrics>(&metrics_key(&today))
            .filter(|m| m.date == today)
            .unwrap_or_else(|| DailyMetrics::empty(today))
    }

    fn read<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        serde_json::from_str(&self.store.get(key)?).ok()
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(crate::store::StoreError::from)
            .and_then(|raw| self.store.set(key, raw));
        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "failed to persist usage state");
        }
    }
}

fn metrics_key(date: &str) -> String {
    format!("{STORAGE_PREFIX}usage_metrics:{date}")
}

fn label(raw: &str) -> String {
    raw.trim().to_lowercase().chars().take(ANALYTICS_LABEL_MAX).collect()
}
