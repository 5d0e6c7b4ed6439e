pub mod stats;
pub mod tier;

pub use stats::{PerformanceMonitor, PerformanceSample};
pub use tier::{assess, Assessment, LatencyClass, PerformanceTier};
