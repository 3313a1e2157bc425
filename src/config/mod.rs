use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::region::SortHint;

const DEFAULT_ADMISSION_TIMEOUT_MS: u64 = 5_000;

/// How a region treats prior entries when a new navigation commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Single active entry with a back/forward journal.
    Stack,
    /// Single active entry, no history.
    #[default]
    Replace,
    /// Every navigation adds another active entry.
    Accumulate,
}

/// Per-region navigation knobs. Set once when the region is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub navigation_mode: NavigationMode,
    /// Retain outgoing views when neither the view nor its view-model says otherwise.
    pub default_keep_alive: bool,
    /// Bounded wait for the per-region navigation lock.
    pub admission_timeout_ms: u64,
    pub sort_hint: SortHint,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            navigation_mode: NavigationMode::Replace,
            default_keep_alive: false,
            admission_timeout_ms: DEFAULT_ADMISSION_TIMEOUT_MS,
            sort_hint: SortHint::Append,
        }
    }
}

impl RegionConfig {
    pub fn replace() -> Self {
        Self::default()
    }

    /// Stack regions keep outgoing entries alive by default so the journal can
    /// step back without re-resolving.
    pub fn stack() -> Self {
        Self {
            navigation_mode: NavigationMode::Stack,
            default_keep_alive: true,
            ..Self::default()
        }
    }

    pub fn accumulate() -> Self {
        Self {
            navigation_mode: NavigationMode::Accumulate,
            ..Self::default()
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.default_keep_alive = keep_alive;
        self
    }

    pub fn with_admission_timeout(mut self, timeout: Duration) -> Self {
        self.admission_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_sort_hint(mut self, sort_hint: SortHint) -> Self {
        self.sort_hint = sort_hint;
        self
    }

    pub fn admission_timeout(&self) -> Duration {
        Duration::from_millis(self.admission_timeout_ms)
    }
}

/// Region manager configuration, typically loaded from JSON at startup.
///
/// ```json
/// {
///   "default_region": { "navigation_mode": "replace" },
///   "regions": {
///     "main": { "navigation_mode": "stack", "admission_timeout_ms": 2000 },
///     "toolbar": { "navigation_mode": "accumulate" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub default_region: RegionConfig,
    pub regions: HashMap<String, RegionConfig>,
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_region(mut self, name: impl Into<String>, config: RegionConfig) -> Self {
        self.regions.insert(name.into(), config);
        self
    }

    /// Configuration for `name`, falling back to the default region config.
    pub fn region(&self, name: &str) -> RegionConfig {
        self.regions
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_region.clone())
    }
}
