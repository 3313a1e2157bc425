mod types;

pub use types::{BoxError, RegionError, Result};
