use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::capability::View;
use crate::error::{RegionError, Result};

/// Region handle shared between the manager, its navigation service and any
/// surface adapter.
pub type SharedRegion = Arc<RwLock<Region>>;

/// Opaque handle to whatever surface projects a region.
pub type RegionTarget = Arc<dyn Any + Send + Sync>;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Where newly added views land in the membership order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortHint {
    #[default]
    Append,
    Prepend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Identity-compared handle to a view instance.
///
/// Two handles are equal only when they were cloned from the same
/// [`ViewHandle::new`] call, regardless of the view's contents.
#[derive(Clone)]
pub struct ViewHandle {
    id: ViewId,
    view: Arc<dyn View>,
}

impl ViewHandle {
    pub fn new<V: View>(view: V) -> Self {
        Self::from_arc(Arc::new(view))
    }

    pub fn from_arc(view: Arc<dyn View>) -> Self {
        Self {
            id: ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed)),
            view,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn view(&self) -> &dyn View {
        self.view.as_ref()
    }

    pub fn name(&self) -> &str {
        self.view.name()
    }
}

impl PartialEq for ViewHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ViewHandle {}

impl Hash for ViewHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHandle")
            .field("id", &self.id)
            .field("name", &self.view.name())
            .finish()
    }
}

/// Membership and activation changes emitted by a [`Region`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionEvent {
    ViewAdded(ViewHandle),
    ViewRemoved(ViewHandle),
    ViewActivated(ViewHandle),
    ViewDeactivated(ViewHandle),
}

impl RegionEvent {
    pub fn view(&self) -> &ViewHandle {
        match self {
            Self::ViewAdded(view)
            | Self::ViewRemoved(view)
            | Self::ViewActivated(view)
            | Self::ViewDeactivated(view) => view,
        }
    }
}

/// Receives region notifications synchronously, before the mutating call
/// returns. Observers run while the region is borrowed and must not call
/// back into it.
pub trait RegionObserver: Send + Sync {
    fn on_region_event(&self, region: &str, event: &RegionEvent);
}

impl<F> RegionObserver for F
where
    F: Fn(&str, &RegionEvent) + Send + Sync,
{
    fn on_region_event(&self, region: &str, event: &RegionEvent) {
        self(region, event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Ordered view collection for one named placeholder.
///
/// `Region` is not synchronised on its own; share it through
/// [`SharedRegion`] and mutate it via the manager or navigation service.
pub struct Region {
    name: String,
    sort_hint: SortHint,
    views: Vec<ViewHandle>,
    members: HashSet<ViewId>,
    active: HashSet<ViewId>,
    target: Option<RegionTarget>,
    observers: Vec<(SubscriptionId, Arc<dyn RegionObserver>)>,
    next_subscription: u64,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sort_hint(name, SortHint::Append)
    }

    pub fn with_sort_hint(name: impl Into<String>, sort_hint: SortHint) -> Self {
        Self {
            name: name.into(),
            sort_hint,
            views: Vec::new(),
            members: HashSet::new(),
            active: HashSet::new(),
            target: None,
            observers: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn into_shared(self) -> SharedRegion {
        Arc::new(RwLock::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_hint(&self) -> SortHint {
        self.sort_hint
    }

    /// Insert `view`. Adding a handle that is already a member is a no-op.
    pub fn add(&mut self, view: ViewHandle) -> ViewHandle {
        if !self.members.insert(view.id()) {
            return view;
        }
        match self.sort_hint {
            SortHint::Append => self.views.push(view.clone()),
            SortHint::Prepend => self.views.insert(0, view.clone()),
        }
        self.emit(RegionEvent::ViewAdded(view.clone()));
        view
    }

    /// Remove `view`, deactivating it first. Returns `false` if it was absent.
    pub fn remove(&mut self, view: &ViewHandle) -> bool {
        if !self.members.contains(&view.id()) {
            return false;
        }
        self.deactivate(view);
        self.members.remove(&view.id());
        self.views.retain(|candidate| candidate.id() != view.id());
        self.emit(RegionEvent::ViewRemoved(view.clone()));
        true
    }

    /// Remove every member in membership order.
    pub fn remove_all(&mut self) {
        let views = self.views.clone();
        for view in &views {
            self.remove(view);
        }
    }

    pub fn activate(&mut self, view: &ViewHandle) -> Result<()> {
        if !self.members.contains(&view.id()) {
            return Err(RegionError::InvalidState(format!(
                "{} is not a member of region `{}`",
                view.id(),
                self.name
            )));
        }
        if self.active.insert(view.id()) {
            self.emit(RegionEvent::ViewActivated(view.clone()));
        }
        Ok(())
    }

    pub fn deactivate(&mut self, view: &ViewHandle) {
        if self.active.remove(&view.id()) {
            self.emit(RegionEvent::ViewDeactivated(view.clone()));
        }
    }

    pub fn contains(&self, view: &ViewHandle) -> bool {
        self.members.contains(&view.id())
    }

    pub fn is_active(&self, view: &ViewHandle) -> bool {
        self.active.contains(&view.id())
    }

    pub fn views(&self) -> &[ViewHandle] {
        &self.views
    }

    /// Active views, reported in membership order.
    pub fn active_views(&self) -> Vec<ViewHandle> {
        self.views
            .iter()
            .filter(|view| self.active.contains(&view.id()))
            .cloned()
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Bind the surface projecting this region. Can only be done once.
    pub fn set_target(&mut self, target: RegionTarget) -> Result<()> {
        if self.target.is_some() {
            return Err(RegionError::TargetAlreadySet(self.name.clone()));
        }
        self.target = Some(target);
        Ok(())
    }

    pub fn target(&self) -> Option<&RegionTarget> {
        self.target.as_ref()
    }

    pub fn subscribe<O>(&mut self, observer: O) -> SubscriptionId
    where
        O: RegionObserver + 'static,
    {
        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(candidate, _)| *candidate != id);
        self.observers.len() != before
    }

    fn emit(&self, event: RegionEvent) {
        for (_, observer) in &self.observers {
            observer.on_region_event(&self.name, &event);
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("sort_hint", &self.sort_hint)
            .field("views", &self.views)
            .field("active", &self.active.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
