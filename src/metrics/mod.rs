use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Shared metrics handle, one per manager.
pub type SharedMetrics = Arc<Mutex<NavigationMetrics>>;

#[derive(Debug, Default, Clone)]
pub struct NavigationMetrics {
    attempts: u64,
    committed: u64,
    denied: u64,
    timeouts: u64,
    cancelled: u64,
    retained: u64,
    destroyed: u64,
    post_commit_failures: u64,
}

impl NavigationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMetrics {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn record_commit(&mut self) {
        self.committed = self.committed.saturating_add(1);
    }

    pub fn record_denial(&mut self) {
        self.denied = self.denied.saturating_add(1);
    }

    pub fn record_timeout(&mut self) {
        self.timeouts = self.timeouts.saturating_add(1);
    }

    pub fn record_cancellation(&mut self) {
        self.cancelled = self.cancelled.saturating_add(1);
    }

    pub fn record_retained(&mut self) {
        self.retained = self.retained.saturating_add(1);
    }

    pub fn record_destroyed(&mut self, count: usize) {
        self.destroyed = self.destroyed.saturating_add(count as u64);
    }

    pub fn record_post_commit_failure(&mut self) {
        self.post_commit_failures = self.post_commit_failures.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            attempts: self.attempts,
            committed: self.committed,
            denied: self.denied,
            timeouts: self.timeouts,
            cancelled: self.cancelled,
            retained: self.retained,
            destroyed: self.destroyed,
            post_commit_failures: self.post_commit_failures,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub attempts: u64,
    pub committed: u64,
    pub denied: u64,
    pub timeouts: u64,
    pub cancelled: u64,
    pub retained: u64,
    pub destroyed: u64,
    pub post_commit_failures: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "navigation_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("attempts".to_string(), json!(self.attempts));
        map.insert("committed".to_string(), json!(self.committed));
        map.insert("denied".to_string(), json!(self.denied));
        map.insert("timeouts".to_string(), json!(self.timeouts));
        map.insert("cancelled".to_string(), json!(self.cancelled));
        map.insert("retained".to_string(), json!(self.retained));
        map.insert("destroyed".to_string(), json!(self.destroyed));
        map.insert(
            "post_commit_failures".to_string(),
            json!(self.post_commit_failures),
        );
        map
    }
}

/// Apply `update` to a shared handle, ignoring a poisoned lock.
pub(crate) fn with_metrics(
    metrics: Option<&SharedMetrics>,
    update: impl FnOnce(&mut NavigationMetrics),
) {
    if let Some(metrics) = metrics {
        if let Ok(mut guard) = metrics.lock() {
            update(&mut *guard);
        }
    }
}
