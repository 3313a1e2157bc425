mod core;

pub use self::core::{RegionManager, RegionManagerEvent, RegionManagerObserver};
