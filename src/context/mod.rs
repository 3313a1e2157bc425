//! Per-attempt navigation data.
//!
//! A [`NavigationRequest`] is what callers hand to the manager; the
//! navigation service turns it into an immutable [`NavigationContext`] once
//! the target view-model has been resolved, and threads that context through
//! every guard and lifecycle callback of the attempt.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Identity of a navigation target, e.g. `"settings"` or `"orders.detail"`.
pub type TargetId = String;

/// Opaque caller-supplied payload. Recover the concrete type with
/// [`NavigationContext::parameter`].
pub type NavigationParameter = Arc<dyn Any + Send + Sync>;

/// Informational direction of a navigation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    #[default]
    Forward,
    Back,
    Replace,
}

/// Caller-side description of a navigation.
#[derive(Clone, Default)]
pub struct NavigationRequest {
    pub target: TargetId,
    pub parameter: Option<NavigationParameter>,
    pub direction: NavigationDirection,
    pub cancellation: Option<CancellationToken>,
}

impl NavigationRequest {
    pub fn new(target: impl Into<TargetId>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter<P>(mut self, parameter: P) -> Self
    where
        P: Any + Send + Sync,
    {
        self.parameter = Some(Arc::new(parameter));
        self
    }

    pub fn with_shared_parameter(mut self, parameter: NavigationParameter) -> Self {
        self.parameter = Some(parameter);
        self
    }

    pub fn with_direction(mut self, direction: NavigationDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

impl From<&str> for NavigationRequest {
    fn from(target: &str) -> Self {
        Self::new(target)
    }
}

impl From<String> for NavigationRequest {
    fn from(target: String) -> Self {
        Self::new(target)
    }
}

impl fmt::Debug for NavigationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRequest")
            .field("target", &self.target)
            .field("has_parameter", &self.parameter.is_some())
            .field("direction", &self.direction)
            .field("cancellable", &self.cancellation.is_some())
            .finish()
    }
}

/// Immutable record of one navigation attempt.
#[derive(Clone)]
pub struct NavigationContext {
    region: String,
    parameter: Option<NavigationParameter>,
    direction: NavigationDirection,
    source: Option<TargetId>,
    source_view_model: Option<&'static str>,
    target: TargetId,
    target_view_model: &'static str,
    cancellation: CancellationToken,
}

impl NavigationContext {
    pub(crate) fn new(
        region: impl Into<String>,
        request: &NavigationRequest,
        source: Option<(TargetId, &'static str)>,
        target_view_model: &'static str,
    ) -> Self {
        let (source, source_view_model) = match source {
            Some((target, type_name)) => (Some(target), Some(type_name)),
            None => (None, None),
        };
        Self {
            region: region.into(),
            parameter: request.parameter.clone(),
            direction: request.direction,
            source,
            source_view_model,
            target: request.target.clone(),
            target_view_model,
            cancellation: request.cancellation.clone().unwrap_or_default(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Typed view of the caller's payload. `None` when absent or of another type.
    pub fn parameter<T: Any>(&self) -> Option<&T> {
        self.parameter.as_deref()?.downcast_ref::<T>()
    }

    pub fn raw_parameter(&self) -> Option<&NavigationParameter> {
        self.parameter.as_ref()
    }

    pub fn direction(&self) -> NavigationDirection {
        self.direction
    }

    /// Target id of the outgoing entry, if the region had one.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn source_view_model_type(&self) -> Option<&'static str> {
        self.source_view_model
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_view_model_type(&self) -> &'static str {
        self.target_view_model
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("region", &self.region)
            .field("direction", &self.direction)
            .field("source", &self.source)
            .field("source_view_model", &self.source_view_model)
            .field("target", &self.target)
            .field("target_view_model", &self.target_view_model)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct OrderId(u32);

    #[test]
    fn parameter_downcasts_to_call_site_type() {
        let request = NavigationRequest::new("orders.detail").with_parameter(OrderId(7));
        let ctx = NavigationContext::new("main", &request, None, "OrdersViewModel");

        assert_eq!(ctx.parameter::<OrderId>(), Some(&OrderId(7)));
        assert!(ctx.parameter::<String>().is_none());
        assert_eq!(ctx.target(), "orders.detail");
        assert!(ctx.source().is_none());
    }

    #[test]
    fn context_carries_source_identity() {
        let request =
            NavigationRequest::from("b").with_direction(NavigationDirection::Back);
        let source = Some(("a".into(), "AViewModel"));
        let ctx = NavigationContext::new("main", &request, source, "BViewModel");

        assert_eq!(ctx.source(), Some("a"));
        assert_eq!(ctx.source_view_model_type(), Some("AViewModel"));
        assert_eq!(ctx.target_view_model_type(), "BViewModel");
        assert_eq!(ctx.direction(), NavigationDirection::Back);
    }

    #[test]
    fn cancellation_is_shared_with_caller() {
        let token = CancellationToken::new();
        let request = NavigationRequest::new("a").with_cancellation(token.clone());
        let ctx = NavigationContext::new("main", &request, None, "AViewModel");

        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
