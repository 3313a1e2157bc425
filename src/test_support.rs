//! Scripted view-models and a resolver for exercising the protocol.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;

use crate::capability::{
    Activatable, ConfirmContinuation, ConfirmNavigation, ConfirmNavigationCallback, Destructible,
    Initializable, LifecycleResult, LifetimeOverride, NavigationAware, View, ViewModel,
};
use crate::context::NavigationContext;
use crate::error::BoxError;
use crate::navigation::{RegionNavigationService, ViewModelResolver, ViewResolver};
use crate::region::{RegionEvent, ViewHandle};

pub(crate) type SharedLog = Arc<Mutex<Vec<String>>>;

/// Behaviour switches for every instance of one target. Read at call time,
/// so tests can flip them between navigations.
#[derive(Debug, Clone)]
pub(crate) struct Flags {
    pub aware: bool,
    pub allow_leave: bool,
    pub allow_enter: bool,
    pub confirm: Option<bool>,
    pub callback_confirm: Option<bool>,
    pub keep_alive: Option<bool>,
    pub view_keep_alive: Option<bool>,
    pub fail_initialize: bool,
    pub fail_navigated_to: bool,
    pub enter_delay: Option<Duration>,
    pub redirect_on_activate: Option<&'static str>,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            aware: true,
            allow_leave: true,
            allow_enter: true,
            confirm: None,
            callback_confirm: None,
            keep_alive: None,
            view_keep_alive: None,
            fail_initialize: false,
            fail_navigated_to: false,
            enter_delay: None,
            redirect_on_activate: None,
        }
    }
}

pub(crate) struct ScriptedViewModel {
    target: String,
    flags: Arc<Mutex<Flags>>,
    log: SharedLog,
    redirect: Option<Weak<RegionNavigationService>>,
    initialized: AtomicBool,
    destroyed: AtomicUsize,
}

impl ScriptedViewModel {
    fn flags(&self) -> Flags {
        self.flags.lock().unwrap().clone()
    }

    fn note(&self, what: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.target, what));
    }

    pub fn destroy_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl ViewModel for ScriptedViewModel {
    fn as_navigation_aware(&self) -> Option<&dyn NavigationAware> {
        self.flags().aware.then_some(self as &dyn NavigationAware)
    }

    fn as_confirm_navigation(&self) -> Option<&dyn ConfirmNavigation> {
        self.flags()
            .confirm
            .map(|_| self as &dyn ConfirmNavigation)
    }

    fn as_confirm_navigation_callback(&self) -> Option<&dyn ConfirmNavigationCallback> {
        self.flags()
            .callback_confirm
            .map(|_| self as &dyn ConfirmNavigationCallback)
    }

    fn as_lifetime_override(&self) -> Option<&dyn LifetimeOverride> {
        self.flags()
            .keep_alive
            .map(|_| self as &dyn LifetimeOverride)
    }

    fn as_activatable(&self) -> Option<&dyn Activatable> {
        Some(self)
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        Some(self)
    }

    fn as_destructible(&self) -> Option<&dyn Destructible> {
        Some(self)
    }
}

#[async_trait]
impl NavigationAware for ScriptedViewModel {
    async fn can_navigate_from(&self, _ctx: &NavigationContext) -> bool {
        self.note("can_navigate_from");
        self.flags().allow_leave
    }

    async fn can_navigate_to(&self, _ctx: &NavigationContext) -> bool {
        self.note("can_navigate_to");
        let flags = self.flags();
        if let Some(delay) = flags.enter_delay {
            tokio::time::sleep(delay).await;
        }
        flags.allow_enter
    }

    async fn on_navigated_from(&self, _ctx: &NavigationContext) {
        self.note("navigated_from");
    }

    async fn on_navigated_to(&self, _ctx: &NavigationContext) -> LifecycleResult {
        self.note("navigated_to");
        if self.flags().fail_navigated_to {
            return Err("navigated_to exploded".into());
        }
        Ok(())
    }
}

#[async_trait]
impl ConfirmNavigation for ScriptedViewModel {
    async fn confirm_navigation_request(&self, _ctx: &NavigationContext) -> bool {
        self.note("confirm");
        self.flags().confirm.unwrap_or(true)
    }
}

impl ConfirmNavigationCallback for ScriptedViewModel {
    fn confirm_navigation_request(
        &self,
        _ctx: &NavigationContext,
        continuation: ConfirmContinuation,
    ) {
        self.note("confirm_callback");
        continuation(self.flags().callback_confirm.unwrap_or(true));
    }
}

impl LifetimeOverride for ScriptedViewModel {
    fn keep_alive(&self) -> bool {
        self.flags().keep_alive.unwrap_or(false)
    }
}

#[async_trait]
impl Activatable for ScriptedViewModel {
    async fn activate(&self, _ctx: &NavigationContext) -> LifecycleResult {
        self.note("activate");
        let redirect = self.flags().redirect_on_activate;
        if let (Some(target), Some(service)) =
            (redirect, self.redirect.as_ref().and_then(Weak::upgrade))
        {
            service.request_navigate(target).await?;
        }
        Ok(())
    }

    async fn deactivate(&self, _ctx: &NavigationContext) {
        self.note("deactivate");
    }
}

#[async_trait]
impl Initializable for ScriptedViewModel {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn initialize(&self, _ctx: &NavigationContext) -> LifecycleResult {
        self.note("initialize");
        if self.flags().fail_initialize {
            return Err("initialize exploded".into());
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Destructible for ScriptedViewModel {
    fn destroy(&self) {
        self.note("destroy");
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct ScriptedView {
    target: String,
    flags: Arc<Mutex<Flags>>,
}

impl View for ScriptedView {
    fn name(&self) -> &str {
        &self.target
    }

    fn as_lifetime_override(&self) -> Option<&dyn LifetimeOverride> {
        self.flags
            .lock()
            .unwrap()
            .view_keep_alive
            .map(|_| self as &dyn LifetimeOverride)
    }
}

impl LifetimeOverride for ScriptedView {
    fn keep_alive(&self) -> bool {
        self.flags
            .lock()
            .unwrap()
            .view_keep_alive
            .unwrap_or(false)
    }
}

/// Resolver pair handing out [`ScriptedViewModel`]s for any target.
#[derive(Default)]
pub(crate) struct Harness {
    flags: Mutex<HashMap<String, Arc<Mutex<Flags>>>>,
    log: SharedLog,
    instances: Mutex<Vec<Arc<ScriptedViewModel>>>,
    redirect: Mutex<Option<Weak<RegionNavigationService>>>,
    unknown: Mutex<Vec<String>>,
}

impl Harness {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn flags_for(&self, target: &str) -> Arc<Mutex<Flags>> {
        self.flags
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .clone()
    }

    pub fn configure(&self, target: &str, update: impl FnOnce(&mut Flags)) {
        let flags = self.flags_for(target);
        update(&mut *flags.lock().unwrap());
    }

    /// Targets that fail to resolve.
    pub fn reject(&self, target: &str) {
        self.unknown.lock().unwrap().push(target.to_string());
    }

    pub fn redirect_through(&self, service: &Arc<RegionNavigationService>) {
        *self.redirect.lock().unwrap() = Some(Arc::downgrade(service));
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn instances(&self, target: &str) -> Vec<Arc<ScriptedViewModel>> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .filter(|vm| vm.target == target)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ViewModelResolver for Harness {
    async fn resolve(&self, target: &str) -> Result<Arc<dyn ViewModel>, BoxError> {
        if self.unknown.lock().unwrap().iter().any(|t| t == target) {
            return Err(format!("unknown target `{target}`").into());
        }
        let vm = Arc::new(ScriptedViewModel {
            target: target.to_string(),
            flags: self.flags_for(target),
            log: self.log.clone(),
            redirect: self.redirect.lock().unwrap().clone(),
            initialized: AtomicBool::new(false),
            destroyed: AtomicUsize::new(0),
        });
        self.instances.lock().unwrap().push(vm.clone());
        Ok(vm)
    }
}

impl ViewResolver for Harness {
    fn resolve_view(
        &self,
        _view_model_type: &'static str,
        view_model: &Arc<dyn ViewModel>,
    ) -> Result<ViewHandle, BoxError> {
        let wanted = Arc::as_ptr(view_model) as *const ();
        let instances = self.instances.lock().unwrap();
        let vm = instances
            .iter()
            .find(|vm| Arc::as_ptr(vm) as *const () == wanted)
            .ok_or("view-model was not produced by this harness")?;
        Ok(ViewHandle::new(ScriptedView {
            target: vm.target.clone(),
            flags: vm.flags.clone(),
        }))
    }
}

/// Records region notifications as `kind:view-name` strings.
pub(crate) fn region_recorder() -> (SharedLog, impl Fn(&str, &RegionEvent) + Send + Sync) {
    let log: SharedLog = Arc::default();
    let sink = log.clone();
    let observer = move |_: &str, event: &RegionEvent| {
        let kind = match event {
            RegionEvent::ViewAdded(_) => "added",
            RegionEvent::ViewRemoved(_) => "removed",
            RegionEvent::ViewActivated(_) => "activated",
            RegionEvent::ViewDeactivated(_) => "deactivated",
        };
        sink.lock()
            .unwrap()
            .push(format!("{}:{}", kind, event.view().name()));
    };
    (log, observer)
}
