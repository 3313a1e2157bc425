use serde_json::json;

use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::audit::{NavigationAudit, NavigationAuditEvent, NavigationAuditStage};

pub const NAVIGATION_LOG_TARGET: &str = "room_regions::navigation";

/// Forwards audit records to a structured [`Logger`].
///
/// Refusals and timeouts log at `Info`, post-commit failures at `Warn`, and
/// everything else at the configured routine level.
pub struct LoggingNavigationAudit {
    logger: Logger,
    level: LogLevel,
    target: String,
    log_attempts: bool,
}

impl LoggingNavigationAudit {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            target: NAVIGATION_LOG_TARGET.to_string(),
            log_attempts: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn log_attempts(mut self, enabled: bool) -> Self {
        self.log_attempts = enabled;
        self
    }

    fn level_for(&self, stage: NavigationAuditStage) -> LogLevel {
        match stage {
            NavigationAuditStage::PostCommitFailed => LogLevel::Warn,
            NavigationAuditStage::AdmissionTimedOut
            | NavigationAuditStage::OutboundDenied
            | NavigationAuditStage::InboundDenied
            | NavigationAuditStage::Cancelled => LogLevel::Info,
            _ => self.level,
        }
    }
}

impl NavigationAudit for LoggingNavigationAudit {
    fn record(&self, event: NavigationAuditEvent) {
        if event.stage == NavigationAuditStage::AttemptStarted && !self.log_attempts {
            return;
        }
        let level = self.level_for(event.stage);
        let fields = std::iter::once(json_kv("region", json!(event.region)))
            .chain(event.details);
        let log = event_with_fields(level, &self.target, event.stage.as_str(), fields);
        let _ = self.logger.log_event(log);
    }
}
