pub mod audit;
pub mod diagnostics;
mod journal;
mod resolver;
mod service;

pub use audit::{
    BufferedNavigationAudit, NavigationAudit, NavigationAuditEvent, NavigationAuditEventBuilder,
    NavigationAuditStage, NullNavigationAudit,
};
pub use diagnostics::{LoggingNavigationAudit, NAVIGATION_LOG_TARGET};
pub use journal::{JournalEntry, NavigationJournal};
pub use resolver::{
    TargetCatalog, TargetDefinition, TargetMetadata, ViewFactory, ViewModelFactory,
    ViewModelResolver, ViewResolver,
};
pub use service::RegionNavigationService;
