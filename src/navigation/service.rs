use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLockWriteGuard};

use tokio::time::timeout;

use crate::capability::{ViewModel, confirm_via_callback};
use crate::config::{NavigationMode, RegionConfig};
use crate::context::{NavigationContext, NavigationDirection, NavigationRequest, TargetId};
use crate::error::{BoxError, RegionError, Result};
use crate::metrics::{NavigationMetrics, SharedMetrics, with_metrics};
use crate::region::{Region, SharedRegion, ViewHandle};

use super::audit::{
    NavigationAudit, NavigationAuditEventBuilder, NavigationAuditStage, NullNavigationAudit,
};
use super::journal::{JournalEntry, JournalMove, NavigationJournal};
use super::resolver::{ViewModelResolver, ViewResolver};

/// A view and its view-model as owned by the service.
#[derive(Clone)]
struct RegionEntry {
    target: TargetId,
    view_model: Arc<dyn ViewModel>,
    view: ViewHandle,
}

#[derive(Default)]
struct NavigationState {
    current: Option<RegionEntry>,
    /// Inactive members kept alive for reuse, one per target.
    retained: HashMap<TargetId, RegionEntry>,
    /// Earlier entries of an accumulate region; all still active.
    accumulated: Vec<RegionEntry>,
    journal: NavigationJournal,
    /// Set by teardown; later attempts are rejected.
    closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Keep,
    Retain,
    Destroy,
}

enum Plan {
    Request(NavigationRequest),
    Back,
    Forward,
}

/// What phase 9 needs once the lock is gone.
struct Committed {
    view_model: Arc<dyn ViewModel>,
    ctx: NavigationContext,
}

/// Per-region navigation state machine.
///
/// An attempt runs admission, resolution, the outbound and inbound guards,
/// deactivation of the outgoing view-model, the retain-or-destroy decision,
/// and the commit while holding the region's admission lock. Any refusal
/// before the commit leaves the region untouched. The incoming view-model's
/// initialise / navigated-to / activate callbacks run after the lock is
/// released so they may navigate the same region again.
pub struct RegionNavigationService {
    region_name: String,
    region: SharedRegion,
    config: RegionConfig,
    view_models: Arc<dyn ViewModelResolver>,
    views: Arc<dyn ViewResolver>,
    admission: tokio::sync::Mutex<()>,
    state: Mutex<NavigationState>,
    audit: Arc<dyn NavigationAudit>,
    metrics: Option<SharedMetrics>,
}

impl RegionNavigationService {
    pub fn new(
        region: SharedRegion,
        config: RegionConfig,
        view_models: Arc<dyn ViewModelResolver>,
        views: Arc<dyn ViewResolver>,
    ) -> Result<Self> {
        let region_name = region
            .read()
            .map_err(|_| RegionError::Poisoned("region"))?
            .name()
            .to_string();
        Ok(Self {
            region_name,
            region,
            config,
            view_models,
            views,
            admission: tokio::sync::Mutex::new(()),
            state: Mutex::new(NavigationState::default()),
            audit: Arc::new(NullNavigationAudit),
            metrics: None,
        })
    }

    pub fn with_audit(mut self, audit: Arc<dyn NavigationAudit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    pub fn navigation_mode(&self) -> NavigationMode {
        self.config.navigation_mode
    }

    pub fn current_view(&self) -> Option<ViewHandle> {
        let state = self.state.lock().ok()?;
        state.current.as_ref().map(|entry| entry.view.clone())
    }

    pub fn current_view_model(&self) -> Option<Arc<dyn ViewModel>> {
        let state = self.state.lock().ok()?;
        state.current.as_ref().map(|entry| entry.view_model.clone())
    }

    pub fn current_target(&self) -> Option<TargetId> {
        let state = self.state.lock().ok()?;
        state.current.as_ref().map(|entry| entry.target.clone())
    }

    /// Targets whose views are parked in the region for reuse.
    pub fn retained_targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<_> = self
            .state
            .lock()
            .map(|state| state.retained.keys().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        targets
    }

    pub fn journal(&self) -> NavigationJournal {
        self.state
            .lock()
            .map(|state| state.journal.clone())
            .unwrap_or_default()
    }

    pub fn can_go_back(&self) -> bool {
        self.journal().can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.journal().can_go_forward()
    }

    /// Run one navigation attempt.
    ///
    /// Returns `Ok(true)` once the new view is committed, `Ok(false)` for
    /// guard denial, admission timeout or cancellation, and `Err` only for
    /// invalid requests, resolver failures and a torn-down service.
    pub async fn request_navigate(&self, request: impl Into<NavigationRequest>) -> Result<bool> {
        let request = request.into();
        if request.target.trim().is_empty() {
            return Err(RegionError::EmptyTarget);
        }
        self.execute(Plan::Request(request)).await
    }

    /// Step back through the journal. `Ok(false)` when there is nothing to go back to.
    pub async fn go_back(&self) -> Result<bool> {
        self.execute(Plan::Back).await
    }

    pub async fn go_forward(&self) -> Result<bool> {
        self.execute(Plan::Forward).await
    }

    /// Destroy everything the service owns, empty the region and close the
    /// service. The current view-model is deactivated and told it has been
    /// left before it is destroyed.
    ///
    /// Waits for an in-flight navigation instead of timing out. Returns the
    /// number of view-models released; a second call releases nothing.
    /// Navigation attempts after teardown fail with
    /// [`RegionError::RegionRemoved`].
    pub async fn teardown(&self) -> Result<usize> {
        let _admission = self.admission.lock().await;
        let (current, mut entries) = {
            let mut state = self.state()?;
            if state.closed {
                return Ok(0);
            }
            state.closed = true;
            state.journal.clear();
            let mut entries = std::mem::take(&mut state.accumulated);
            entries.extend(state.retained.drain().map(|(_, entry)| entry));
            (state.current.take(), entries)
        };
        if let Some(current) = current {
            let request = NavigationRequest::new(current.target.clone());
            let source = Some((current.target.clone(), current.view_model.type_name()));
            let ctx = NavigationContext::new(
                self.region_name.clone(),
                &request,
                source,
                current.view_model.type_name(),
            );
            if let Some(activatable) = current.view_model.as_activatable() {
                activatable.deactivate(&ctx).await;
            }
            if let Some(aware) = current.view_model.as_navigation_aware() {
                aware.on_navigated_from(&ctx).await;
            }
            entries.insert(0, current);
        }
        self.region_mut()?.remove_all();
        for entry in &entries {
            self.destroy(entry);
        }
        Ok(entries.len())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|state| state.closed).unwrap_or(true)
    }

    async fn execute(&self, plan: Plan) -> Result<bool> {
        with_metrics(self.metrics.as_ref(), NavigationMetrics::record_attempt);
        self.emit(self.event(NavigationAuditStage::AttemptStarted));

        let admission = self.admission.lock();
        let admission = match timeout(self.config.admission_timeout(), admission).await {
            Ok(guard) => guard,
            Err(_) => {
                with_metrics(self.metrics.as_ref(), NavigationMetrics::record_timeout);
                self.emit(
                    self.event(NavigationAuditStage::AdmissionTimedOut)
                        .detail("timeout_ms", self.config.admission_timeout_ms),
                );
                return Ok(false);
            }
        };
        let outcome = self.run_locked(plan).await;
        drop(admission);

        match outcome? {
            Some(committed) => {
                self.run_post_commit(committed).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_locked(&self, plan: Plan) -> Result<Option<Committed>> {
        let accumulate = self.config.navigation_mode == NavigationMode::Accumulate;

        let (request, movement, previous, reusable) = {
            let state = self.state()?;
            if state.closed {
                return Err(RegionError::RegionRemoved(self.region_name.clone()));
            }
            let (request, movement) = match plan {
                Plan::Request(request) => {
                    let movement = if request.direction == NavigationDirection::Replace {
                        JournalMove::Replace
                    } else {
                        JournalMove::Push
                    };
                    (request, movement)
                }
                Plan::Back => match state.journal.peek_back() {
                    Some(entry) => (
                        journal_request(entry, NavigationDirection::Back),
                        JournalMove::Back,
                    ),
                    None => return Ok(None),
                },
                Plan::Forward => match state.journal.peek_forward() {
                    Some(entry) => (
                        journal_request(entry, NavigationDirection::Forward),
                        JournalMove::Forward,
                    ),
                    None => return Ok(None),
                },
            };
            let reusable = if accumulate {
                None
            } else {
                state.retained.get(&request.target).cloned()
            };
            (request, movement, state.current.clone(), reusable)
        };

        let view_model = match &reusable {
            Some(entry) => entry.view_model.clone(),
            None => self
                .view_models
                .resolve(&request.target)
                .await
                .map_err(|source| RegionError::ViewModelResolution {
                    target: request.target.clone(),
                    source,
                })?,
        };

        let source = previous
            .as_ref()
            .map(|entry| (entry.target.clone(), entry.view_model.type_name()));
        let ctx = NavigationContext::new(
            self.region_name.clone(),
            &request,
            source,
            view_model.type_name(),
        );

        if self.cancelled(&ctx) {
            return Ok(None);
        }

        if !accumulate {
            if let Some(previous) = &previous {
                if !self.may_leave(previous.view_model.as_ref(), &ctx).await {
                    self.refuse(NavigationAuditStage::OutboundDenied, &ctx);
                    return Ok(None);
                }
            }
            if !self.may_enter(view_model.as_ref(), &ctx).await {
                self.refuse(NavigationAuditStage::InboundDenied, &ctx);
                return Ok(None);
            }
            if self.cancelled(&ctx) {
                return Ok(None);
            }
        }

        let reused = reusable.is_some();
        let view = match reusable {
            Some(entry) => entry.view,
            None => self
                .views
                .resolve_view(view_model.type_name(), &view_model)
                .map_err(|source| RegionError::ViewResolution {
                    target: request.target.clone(),
                    source,
                })?,
        };

        if !accumulate {
            if let Some(previous) = &previous {
                if let Some(activatable) = previous.view_model.as_activatable() {
                    activatable.deactivate(&ctx).await;
                }
                if let Some(aware) = previous.view_model.as_navigation_aware() {
                    aware.on_navigated_from(&ctx).await;
                }
            }
        }

        let incoming = RegionEntry {
            target: request.target.clone(),
            view_model: view_model.clone(),
            view,
        };
        self.commit(previous, incoming, &request, movement)?;
        self.emit(
            self.event(NavigationAuditStage::Committed)
                .detail("target", ctx.target())
                .detail("direction", direction_label(ctx.direction()))
                .detail("reused", reused),
        );
        with_metrics(self.metrics.as_ref(), NavigationMetrics::record_commit);

        Ok(Some(Committed { view_model, ctx }))
    }

    /// Phases 6 and 7. Region observers run before the service state moves on,
    /// so they still see the outgoing entry as current.
    fn commit(
        &self,
        previous: Option<RegionEntry>,
        incoming: RegionEntry,
        request: &NavigationRequest,
        movement: JournalMove,
    ) -> Result<()> {
        let disposition = previous.map(|entry| {
            let disposition = if self.config.navigation_mode == NavigationMode::Accumulate {
                Disposition::Keep
            } else if self.should_retain(&entry) {
                Disposition::Retain
            } else {
                Disposition::Destroy
            };
            (entry, disposition)
        });

        let evicted = match &disposition {
            Some((entry, Disposition::Retain)) => self
                .state()?
                .retained
                .get(&entry.target)
                .filter(|cached| cached.view != incoming.view)
                .cloned(),
            _ => None,
        };

        {
            let mut region = self.region_mut()?;
            match &disposition {
                Some((entry, Disposition::Retain)) => region.deactivate(&entry.view),
                Some((entry, Disposition::Destroy)) => {
                    region.remove(&entry.view);
                }
                _ => {}
            }
            if let Some(evicted) = &evicted {
                region.remove(&evicted.view);
            }
            region.add(incoming.view.clone());
            region.activate(&incoming.view)?;
        }

        if let Some((entry, Disposition::Destroy)) = &disposition {
            self.destroy(entry);
        }
        if let Some(evicted) = &evicted {
            self.destroy(evicted);
        }

        let mut state = self.state()?;
        if state
            .retained
            .get(&incoming.target)
            .is_some_and(|cached| cached.view == incoming.view)
        {
            state.retained.remove(&incoming.target);
        }
        match disposition {
            Some((entry, Disposition::Retain)) => {
                with_metrics(self.metrics.as_ref(), NavigationMetrics::record_retained);
                self.emit(
                    self.event(NavigationAuditStage::ViewRetained)
                        .detail("target", entry.target.as_str())
                        .detail("view", entry.view.id().get()),
                );
                state.retained.insert(entry.target.clone(), entry);
            }
            Some((entry, Disposition::Keep)) => state.accumulated.push(entry),
            Some((_, Disposition::Destroy)) | None => {}
        }
        if self.config.navigation_mode == NavigationMode::Stack {
            state.journal.record(
                JournalEntry::new(request.target.clone(), request.parameter.clone()),
                movement,
            );
        }
        state.current = Some(incoming);
        Ok(())
    }

    async fn may_leave(&self, view_model: &dyn ViewModel, ctx: &NavigationContext) -> bool {
        if let Some(aware) = view_model.as_navigation_aware() {
            if !aware.can_navigate_from(ctx).await {
                return false;
            }
        }
        if let Some(confirm) = view_model.as_confirm_navigation() {
            return confirm.confirm_navigation_request(ctx).await;
        }
        if let Some(confirm) = view_model.as_confirm_navigation_callback() {
            return confirm_via_callback(confirm, ctx).await;
        }
        true
    }

    async fn may_enter(&self, view_model: &dyn ViewModel, ctx: &NavigationContext) -> bool {
        match view_model.as_navigation_aware() {
            Some(aware) => aware.can_navigate_to(ctx).await,
            None => true,
        }
    }

    /// Phase 9. Each callback is attempted even if an earlier one failed.
    async fn run_post_commit(&self, committed: Committed) {
        let Committed { view_model, ctx } = committed;

        if let Some(initializable) = view_model.as_initializable() {
            if !initializable.is_initialized() {
                if let Err(err) = initializable.initialize(&ctx).await {
                    self.post_commit_failed(&ctx, "initialize", &err);
                }
            }
        }
        if let Some(aware) = view_model.as_navigation_aware() {
            if let Err(err) = aware.on_navigated_to(&ctx).await {
                self.post_commit_failed(&ctx, "on_navigated_to", &err);
            }
        }
        if let Some(activatable) = view_model.as_activatable() {
            if let Err(err) = activatable.activate(&ctx).await {
                self.post_commit_failed(&ctx, "activate", &err);
            }
        }
    }

    fn should_retain(&self, entry: &RegionEntry) -> bool {
        entry
            .view_model
            .as_lifetime_override()
            .map(|lifetime| lifetime.keep_alive())
            .or_else(|| {
                entry
                    .view
                    .view()
                    .as_lifetime_override()
                    .map(|lifetime| lifetime.keep_alive())
            })
            .unwrap_or(self.config.default_keep_alive)
    }

    fn destroy(&self, entry: &RegionEntry) {
        if let Some(destructible) = entry.view_model.as_destructible() {
            destructible.destroy();
        }
        with_metrics(self.metrics.as_ref(), |metrics| metrics.record_destroyed(1));
        self.emit(
            self.event(NavigationAuditStage::ViewDestroyed)
                .detail("target", entry.target.as_str())
                .detail("view", entry.view.id().get()),
        );
    }

    fn cancelled(&self, ctx: &NavigationContext) -> bool {
        if !ctx.is_cancelled() {
            return false;
        }
        with_metrics(self.metrics.as_ref(), NavigationMetrics::record_cancellation);
        self.emit(self.event(NavigationAuditStage::Cancelled).detail("target", ctx.target()));
        true
    }

    fn refuse(&self, stage: NavigationAuditStage, ctx: &NavigationContext) {
        with_metrics(self.metrics.as_ref(), NavigationMetrics::record_denial);
        self.emit(
            self.event(stage)
                .detail("target", ctx.target())
                .detail("source", ctx.source().unwrap_or_default()),
        );
    }

    fn post_commit_failed(&self, ctx: &NavigationContext, callback: &str, err: &BoxError) {
        with_metrics(
            self.metrics.as_ref(),
            NavigationMetrics::record_post_commit_failure,
        );
        self.emit(
            self.event(NavigationAuditStage::PostCommitFailed)
                .detail("target", ctx.target())
                .detail("callback", callback)
                .detail("error", err.to_string()),
        );
    }

    fn event(&self, stage: NavigationAuditStage) -> NavigationAuditEventBuilder {
        NavigationAuditEventBuilder::new(self.region_name.as_str(), stage)
    }

    fn emit(&self, builder: NavigationAuditEventBuilder) {
        self.audit.record(builder.finish());
    }

    fn region_mut(&self) -> Result<RwLockWriteGuard<'_, Region>> {
        self.region
            .write()
            .map_err(|_| RegionError::Poisoned("region"))
    }

    fn state(&self) -> Result<MutexGuard<'_, NavigationState>> {
        self.state
            .lock()
            .map_err(|_| RegionError::Poisoned("navigation state"))
    }
}

impl fmt::Debug for RegionNavigationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionNavigationService")
            .field("region", &self.region_name)
            .field("config", &self.config)
            .field("current", &self.current_target())
            .finish_non_exhaustive()
    }
}

fn journal_request(entry: &JournalEntry, direction: NavigationDirection) -> NavigationRequest {
    NavigationRequest {
        target: entry.target.clone(),
        parameter: entry.parameter.clone(),
        direction,
        cancellation: None,
    }
}

fn direction_label(direction: NavigationDirection) -> &'static str {
    match direction {
        NavigationDirection::Forward => "forward",
        NavigationDirection::Back => "back",
        NavigationDirection::Replace => "replace",
    }
}
