use thiserror::Error;

/// Unified result type for the region engine.
pub type Result<T> = std::result::Result<T, RegionError>;

/// Error type produced by external collaborators (resolvers, lifecycle hooks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Programmer and configuration errors surfaced by the region engine.
///
/// Routine refusals (guard denial, admission timeout, cancellation) are not
/// errors; they come back as `Ok(false)` from the navigation entry points.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("region `{0}` is already registered")]
    DuplicateRegion(String),
    #[error("region `{0}` has been removed")]
    RegionRemoved(String),
    #[error("region name must not be empty")]
    EmptyRegionName,
    #[error("navigation target must not be empty")]
    EmptyTarget,
    #[error("invalid region state: {0}")]
    InvalidState(String),
    #[error("region `{0}` is already bound to a target surface")]
    TargetAlreadySet(String),
    #[error("navigation target `{0}` is not registered")]
    TargetNotRegistered(String),
    #[error("failed to resolve view-model for `{target}`: {source}")]
    ViewModelResolution {
        target: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to resolve view for `{target}`: {source}")]
    ViewResolution {
        target: String,
        #[source]
        source: BoxError,
    },
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
