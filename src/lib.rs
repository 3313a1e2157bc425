//! Region-based view navigation engine.
//!
//! Independently built views and their view-models are composed into named
//! regions of a host UI. A [`RegionManager`] owns the regions; each region
//! gets a [`RegionNavigationService`] that runs guarded, serialised
//! transitions and decides whether outgoing views are retained or destroyed.
//! Rendering is left to whatever adapter observes the regions.

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod navigation;
pub mod region;

#[cfg(test)]
mod test_support;

pub use capability::{
    Activatable, ConfirmContinuation, ConfirmNavigation, ConfirmNavigationCallback, Destructible,
    Initializable, LifecycleResult, LifetimeOverride, NavigationAware, View, ViewModel,
    confirm_via_callback,
};
pub use config::{ManagerConfig, NavigationMode, RegionConfig};
pub use context::{
    NavigationContext, NavigationDirection, NavigationParameter, NavigationRequest, TargetId,
};
pub use error::{BoxError, RegionError, Result};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use manager::{RegionManager, RegionManagerEvent, RegionManagerObserver};
pub use metrics::{MetricSnapshot, NavigationMetrics, SharedMetrics};
pub use navigation::{
    BufferedNavigationAudit, JournalEntry, LoggingNavigationAudit, NavigationAudit,
    NavigationAuditEvent, NavigationAuditEventBuilder, NavigationAuditStage, NavigationJournal,
    NullNavigationAudit, RegionNavigationService, TargetCatalog, TargetDefinition,
    TargetMetadata, ViewModelResolver, ViewResolver,
};
pub use region::{
    Region, RegionEvent, RegionObserver, RegionTarget, SharedRegion, SortHint, SubscriptionId,
    ViewHandle, ViewId,
};

pub use tokio_util::sync::CancellationToken;
