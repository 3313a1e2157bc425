mod core;

pub use self::core::{
    Region, RegionEvent, RegionObserver, RegionTarget, SharedRegion, SortHint, SubscriptionId,
    ViewHandle, ViewId,
};
