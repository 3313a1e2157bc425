//! Navigation lifecycle audit hooks.
//!
//! The navigation service and the region manager report every notable step
//! of an attempt here so callers can log, buffer, or assert on the protocol
//! without instrumenting the state machine itself. Records carry the region
//! name, a stage identifier and structured details.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by the navigation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAuditStage {
    /// A region was created or registered with the manager.
    RegionAdded,
    /// A region was torn down and dropped by the manager.
    RegionRemoved,
    /// A navigation attempt entered admission.
    AttemptStarted,
    /// The per-region lock could not be acquired in time.
    AdmissionTimedOut,
    /// The caller's cancellation token fired before commit.
    Cancelled,
    /// The outgoing view-model refused to be left.
    OutboundDenied,
    /// The incoming view-model refused to be shown.
    InboundDenied,
    /// The outgoing view was kept as an inactive member.
    ViewRetained,
    /// The outgoing view was removed and its view-model destroyed.
    ViewDestroyed,
    /// The new view is active and recorded as current.
    Committed,
    /// A post-commit lifecycle callback failed; the transition still stands.
    PostCommitFailed,
}

impl NavigationAuditStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegionAdded => "region_added",
            Self::RegionRemoved => "region_removed",
            Self::AttemptStarted => "attempt_started",
            Self::AdmissionTimedOut => "admission_timed_out",
            Self::Cancelled => "cancelled",
            Self::OutboundDenied => "outbound_denied",
            Self::InboundDenied => "inbound_denied",
            Self::ViewRetained => "view_retained",
            Self::ViewDestroyed => "view_destroyed",
            Self::Committed => "committed",
            Self::PostCommitFailed => "post_commit_failed",
        }
    }
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct NavigationAuditEvent {
    pub timestamp: SystemTime,
    pub region: String,
    pub stage: NavigationAuditStage,
    pub details: Vec<(String, Value)>,
}

impl NavigationAuditEvent {
    fn new(region: impl Into<String>, stage: NavigationAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            region: region.into(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }
}

/// Builder helper to append fields ergonomically.
pub struct NavigationAuditEventBuilder {
    event: NavigationAuditEvent,
}

impl NavigationAuditEventBuilder {
    pub fn new(region: impl Into<String>, stage: NavigationAuditStage) -> Self {
        Self {
            event: NavigationAuditEvent::new(region, stage),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.details.push((key.into(), value.into()));
        self
    }

    pub fn finish(self) -> NavigationAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait NavigationAudit: Send + Sync {
    fn record(&self, event: NavigationAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullNavigationAudit;

impl NavigationAudit for NullNavigationAudit {
    fn record(&self, _event: NavigationAuditEvent) {}
}

/// Buffers every record in memory.
#[derive(Debug, Default)]
pub struct BufferedNavigationAudit {
    events: Mutex<Vec<NavigationAuditEvent>>,
}

impl BufferedNavigationAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationAuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<NavigationAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl NavigationAudit for BufferedNavigationAudit {
    fn record(&self, event: NavigationAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
