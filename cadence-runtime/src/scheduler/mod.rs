mod builder;
mod handle;
mod scheduler;

pub use builder::{SchedulerBuilder, DEFAULT_WORKER_COUNT};
pub use handle::SchedulerHandle;
pub use scheduler::Scheduler;
