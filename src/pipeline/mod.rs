//! The render loop: scheduling, fault isolation and event fan-out.

pub mod driver;
pub mod error;
pub mod events;
pub mod scheduler;

pub use driver::run_display_loop;
pub use error::FrameProcessingError;
pub use events::{EventBus, PipelineEvent, SchedulerState};
pub use scheduler::{IterationSnapshot, PipelineHandle, RenderScheduler, SchedulerConfig, TickOutcome};
