use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::config::{ManagerConfig, NavigationMode, RegionConfig};
use crate::context::NavigationRequest;
use crate::error::{RegionError, Result};
use crate::metrics::{MetricSnapshot, NavigationMetrics, SharedMetrics};
use crate::navigation::{
    NavigationAudit, NavigationAuditEventBuilder, NavigationAuditStage, NullNavigationAudit,
    RegionNavigationService, TargetCatalog, ViewModelResolver, ViewResolver,
};
use crate::region::{Region, SharedRegion, SubscriptionId, ViewHandle};

/// Registry-level notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionManagerEvent {
    RegionAdded(String),
    RegionRemoved(String),
}

pub trait RegionManagerObserver: Send + Sync {
    fn on_manager_event(&self, event: &RegionManagerEvent);
}

impl<F> RegionManagerObserver for F
where
    F: Fn(&RegionManagerEvent) + Send + Sync,
{
    fn on_manager_event(&self, event: &RegionManagerEvent) {
        self(event)
    }
}

#[derive(Clone)]
struct RegionSlot {
    region: SharedRegion,
    navigation: Arc<RegionNavigationService>,
}

/// Registry mapping region names to regions and their navigation services.
///
/// Resolvers are injected once at construction and shared by every region
/// the manager creates.
pub struct RegionManager {
    regions: RwLock<HashMap<String, RegionSlot>>,
    config: ManagerConfig,
    view_models: Arc<dyn ViewModelResolver>,
    views: Arc<dyn ViewResolver>,
    audit: Arc<dyn NavigationAudit>,
    metrics: Option<SharedMetrics>,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn RegionManagerObserver>)>>,
    next_subscription: AtomicU64,
}

impl RegionManager {
    pub fn new(view_models: Arc<dyn ViewModelResolver>, views: Arc<dyn ViewResolver>) -> Self {
        Self {
            regions: RwLock::new(HashMap::new()),
            config: ManagerConfig::default(),
            view_models,
            views,
            audit: Arc::new(NullNavigationAudit),
            metrics: None,
            observers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn from_catalog(catalog: Arc<TargetCatalog>) -> Self {
        Self::new(catalog.clone(), catalog)
    }

    /// Only affects regions created after the call.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn NavigationAudit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(NavigationMetrics::shared());
        }
    }

    pub fn metrics_handle(&self) -> Option<SharedMetrics> {
        self.metrics.as_ref().map(Arc::clone)
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.metrics.as_ref()?;
        metrics.lock().ok().map(|guard| guard.snapshot())
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Return the named region, creating it with its configured settings on
    /// first use.
    pub fn get_or_create(&self, name: &str) -> Result<SharedRegion> {
        Ok(self.slot_or_create(name)?.region)
    }

    pub fn get(&self, name: &str) -> Option<SharedRegion> {
        self.slot(name).map(|slot| slot.region)
    }

    pub fn navigation(&self, name: &str) -> Option<Arc<RegionNavigationService>> {
        self.slot(name).map(|slot| slot.navigation)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .regions
            .read()
            .map(|regions| regions.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Register an explicitly constructed region using the configured settings
    /// for its name.
    pub fn register(&self, region: Region) -> Result<SharedRegion> {
        let config = self.config.region(region.name());
        self.register_with_config(region, config)
    }

    pub fn register_with_config(
        &self,
        region: Region,
        config: RegionConfig,
    ) -> Result<SharedRegion> {
        let name = region.name().to_string();
        validate_name(&name)?;
        let slot = {
            let mut regions = self.regions_mut()?;
            if regions.contains_key(&name) {
                return Err(RegionError::DuplicateRegion(name));
            }
            let slot = self.build_slot(region.into_shared(), config)?;
            regions.insert(name.clone(), slot.clone());
            slot
        };
        self.region_added(&name);
        Ok(slot.region)
    }

    /// Tear down and drop the named region. Waits for an in-flight navigation
    /// on it to finish first. Returns `false` when no such region exists.
    ///
    /// The region stays registered until teardown has finished, so a
    /// concurrent lookup never sees a half-released region under a fresh
    /// name. Handles to its navigation service obtained earlier fail with
    /// [`RegionError::RegionRemoved`] from then on.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let Some(slot) = self.slot(name) else {
            return Ok(false);
        };
        let released = slot.navigation.teardown().await?;
        let removed = {
            let mut regions = self.regions_mut()?;
            let same = regions
                .get(name)
                .is_some_and(|stored| Arc::ptr_eq(&stored.navigation, &slot.navigation));
            same && regions.remove(name).is_some()
        };
        if !removed {
            return Ok(false);
        }
        self.audit.record(
            NavigationAuditEventBuilder::new(name, NavigationAuditStage::RegionRemoved)
                .detail("released", released as u64)
                .finish(),
        );
        self.notify(&RegionManagerEvent::RegionRemoved(name.to_string()));
        Ok(true)
    }

    /// Insert a view without navigation semantics. Accumulate regions also
    /// activate it; single-entry regions leave activation to navigation.
    pub fn add_view(&self, name: &str, view: ViewHandle) -> Result<ViewHandle> {
        let slot = self.slot_or_create(name)?;
        let mut region = slot
            .region
            .write()
            .map_err(|_| RegionError::Poisoned("region"))?;
        let view = region.add(view);
        if slot.navigation.navigation_mode() == NavigationMode::Accumulate {
            region.activate(&view)?;
        }
        Ok(view)
    }

    /// Navigate the named region. Unknown regions resolve to `Ok(false)`.
    pub async fn navigate(
        &self,
        name: &str,
        request: impl Into<NavigationRequest>,
    ) -> Result<bool> {
        let request = request.into();
        if request.target.trim().is_empty() {
            return Err(RegionError::EmptyTarget);
        }
        match self.navigation(name) {
            Some(navigation) => navigation.request_navigate(request).await,
            None => Ok(false),
        }
    }

    pub async fn go_back(&self, name: &str) -> Result<bool> {
        match self.navigation(name) {
            Some(navigation) => navigation.go_back().await,
            None => Ok(false),
        }
    }

    pub async fn go_forward(&self, name: &str) -> Result<bool> {
        match self.navigation(name) {
            Some(navigation) => navigation.go_forward().await,
            None => Ok(false),
        }
    }

    pub fn subscribe<O>(&self, observer: O) -> SubscriptionId
    where
        O: RegionManagerObserver + 'static,
    {
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut observers) = self.observers.write() {
            observers.push((id, Arc::new(observer)));
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut observers) = self.observers.write() else {
            return false;
        };
        let before = observers.len();
        observers.retain(|(candidate, _)| *candidate != id);
        observers.len() != before
    }

    fn slot(&self, name: &str) -> Option<RegionSlot> {
        self.regions.read().ok()?.get(name).cloned()
    }

    fn slot_or_create(&self, name: &str) -> Result<RegionSlot> {
        validate_name(name)?;
        if let Some(slot) = self.slot(name) {
            return Ok(slot);
        }
        let slot = {
            let mut regions = self.regions_mut()?;
            if let Some(slot) = regions.get(name) {
                return Ok(slot.clone());
            }
            let config = self.config.region(name);
            let region = Region::with_sort_hint(name, config.sort_hint).into_shared();
            let slot = self.build_slot(region, config)?;
            regions.insert(name.to_string(), slot.clone());
            slot
        };
        self.region_added(name);
        Ok(slot)
    }

    fn build_slot(&self, region: SharedRegion, config: RegionConfig) -> Result<RegionSlot> {
        let mut navigation = RegionNavigationService::new(
            region.clone(),
            config,
            self.view_models.clone(),
            self.views.clone(),
        )?
        .with_audit(self.audit.clone());
        if let Some(metrics) = &self.metrics {
            navigation = navigation.with_metrics(metrics.clone());
        }
        Ok(RegionSlot {
            region,
            navigation: Arc::new(navigation),
        })
    }

    fn region_added(&self, name: &str) {
        self.audit.record(
            NavigationAuditEventBuilder::new(name, NavigationAuditStage::RegionAdded).finish(),
        );
        self.notify(&RegionManagerEvent::RegionAdded(name.to_string()));
    }

    fn notify(&self, event: &RegionManagerEvent) {
        let observers: Vec<_> = self
            .observers
            .read()
            .map(|observers| observers.iter().map(|(_, o)| o.clone()).collect())
            .unwrap_or_default();
        for observer in observers {
            observer.on_manager_event(event);
        }
    }

    fn regions_mut(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, RegionSlot>>> {
        self.regions
            .write()
            .map_err(|_| RegionError::Poisoned("region manager"))
    }
}

impl fmt::Debug for RegionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionManager")
            .field("regions", &self.region_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RegionError::EmptyRegionName);
    }
    Ok(())
}
