//! Views, view-models, and the optional capabilities the navigation service
//! probes for.
//!
//! A view-model opts into a capability by overriding the matching `as_*`
//! accessor on [`ViewModel`] to return `Some(self)`. Any subset may be
//! implemented; the navigation service never assumes more than what the
//! accessors report.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::context::NavigationContext;
use crate::error::BoxError;

/// Result of a fallible lifecycle callback.
pub type LifecycleResult = std::result::Result<(), BoxError>;

/// Continuation handed to a callback-style confirmation.
pub type ConfirmContinuation = Box<dyn FnOnce(bool) + Send>;

/// A presentable unit. The engine treats it as an opaque handle.
pub trait View: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_lifetime_override(&self) -> Option<&dyn LifetimeOverride> {
        None
    }
}

/// Behaviour/state object paired with a view.
pub trait ViewModel: Send + Sync + 'static {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        None
    }

    fn as_confirm_navigation(&self) -> Option<&dyn ConfirmNavigation> {
        None
    }

    fn as_confirm_navigation_callback(&self) -> Option<&dyn ConfirmNavigationCallback> {
        None
    }

    fn as_lifetime_override(&self) -> Option<&dyn LifetimeOverride> {
        None
    }

    fn as_activatable(&self) -> Option<&dyn Activatable> {
        None
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        None
    }

    fn as_destructible(&self) -> Option<&dyn Destructible> {
        None
    }
}

/// Guard and lifecycle callbacks around entering and leaving a region slot.
#[async_trait]
pub trait NavigationAware: Send + Sync {
    async fn can_navigate_from(&self, _ctx: &NavigationContext) -> bool {
        true
    }

    async fn can_navigate_to(&self, _ctx: &NavigationContext) -> bool {
        true
    }

    async fn on_navigated_from(&self, _ctx: &NavigationContext) {}

    async fn on_navigated_to(&self, _ctx: &NavigationContext) -> LifecycleResult {
        Ok(())
    }
}

/// Stricter leave check, e.g. "discard unsaved changes?".
#[async_trait]
pub trait ConfirmNavigation: Send + Sync {
    async fn confirm_navigation_request(&self, ctx: &NavigationContext) -> bool;
}

/// Continuation-passing form of [`ConfirmNavigation`].
///
/// Dropping the continuation without calling it counts as a denial.
pub trait ConfirmNavigationCallback: Send + Sync {
    fn confirm_navigation_request(
        &self,
        ctx: &NavigationContext,
        continuation: ConfirmContinuation,
    );
}

/// Adapt a callback-style confirmation into the async contract.
pub async fn confirm_via_callback(
    confirm: &dyn ConfirmNavigationCallback,
    ctx: &NavigationContext,
) -> bool {
    let (tx, rx) = oneshot::channel();
    confirm.confirm_navigation_request(
        ctx,
        Box::new(move |allowed| {
            let _ = tx.send(allowed);
        }),
    );
    rx.await.unwrap_or(false)
}

/// Per-instance override of the region's retain-vs-destroy default.
pub trait LifetimeOverride: Send + Sync {
    fn keep_alive(&self) -> bool;
}

#[async_trait]
pub trait Activatable: Send + Sync {
    async fn activate(&self, _ctx: &NavigationContext) -> LifecycleResult {
        Ok(())
    }

    async fn deactivate(&self, _ctx: &NavigationContext) {}
}

/// One-shot async initialisation. The service skips `initialize` once
/// `is_initialized` reports `true`.
#[async_trait]
pub trait Initializable: Send + Sync {
    fn is_initialized(&self) -> bool;

    async fn initialize(&self, ctx: &NavigationContext) -> LifecycleResult;
}

/// Synchronous cleanup. Implementations must tolerate repeated calls.
pub trait Destructible: Send + Sync {
    fn destroy(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NavigationRequest;

    struct Approves(bool);

    impl ConfirmNavigationCallback for Approves {
        fn confirm_navigation_request(
            &self,
            _ctx: &NavigationContext,
            continuation: ConfirmContinuation,
        ) {
            continuation(self.0);
        }
    }

    struct Forgets;

    impl ConfirmNavigationCallback for Forgets {
        fn confirm_navigation_request(
            &self,
            _ctx: &NavigationContext,
            _continuation: ConfirmContinuation,
        ) {
        }
    }

    struct Bare;

    impl ViewModel for Bare {}

    fn ctx() -> NavigationContext {
        NavigationContext::new("main", &NavigationRequest::new("a"), None, "Bare")
    }

    #[tokio::test]
    async fn callback_confirmation_is_wrapped() {
        assert!(confirm_via_callback(&Approves(true), &ctx()).await);
        assert!(!confirm_via_callback(&Approves(false), &ctx()).await);
    }

    #[tokio::test]
    async fn dropped_continuation_denies() {
        assert!(!confirm_via_callback(&Forgets, &ctx()).await);
    }

    #[test]
    fn bare_view_model_exposes_nothing() {
        let vm = Bare;
        assert!(vm.as_navigation_aware().is_none());
        assert!(vm.as_lifetime_override().is_none());
        assert!(vm.as_destructible().is_none());
        assert!(vm.type_name().ends_with("Bare"));
    }
}
