//! Sample planning and keyframe location

pub mod keyframe_locator;
pub mod scheduler;

pub use keyframe_locator::{KeyframeLocator, LocatedKeyframe, LocatorState, MAX_SCAN_PACKETS};
pub use scheduler::{SamplePlan, TimestampScheduler};
