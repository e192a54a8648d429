//! # Cadence - Declarative Task Scheduling for Rust
//!
//! Declare scheduled units of work by cron expression or fixed
//! interval, hand them to the scheduler, and wrap every execution in a
//! chain of before/after hooks for cross-cutting concerns such as
//! opening and committing a resource session.
//!
//! ## Features
//!
//! - **Cron expressions**: schedule methods using standard cron syntax
//! - **Fixed intervals**: repeat forever at a millisecond interval
//! - **First-run policy**: control whether a job also executes once at
//!   registration (cron defaults to no, fixed defaults to yes)
//! - **Dispatch hooks**: ordered `before()`/`after(failure)` callbacks
//!   around every execution, with failure visibility
//! - **Parameter providers**: shared instances resolved by type into
//!   target-method arguments
//! - **Config support**: cron placeholders like `${app.cron}` and the
//!   `scheduler.thread_count` key read from TOML/YAML config
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cadence::{
//!     DiscoveredJob, JobError, ScheduleDescriptor, ScheduledOwner, SchedulerBuilder,
//! };
//!
//! struct Reporter;
//!
//! impl ScheduledOwner for Reporter {
//!     fn construct() -> Result<Self, JobError> {
//!         Ok(Reporter)
//!     }
//! }
//!
//! impl Reporter {
//!     async fn flush(&self) -> Result<(), JobError> {
//!         println!("flushing");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flush = DiscoveredJob::new::<Reporter, _, _>(
//!         ScheduleDescriptor::fixed(30_000),
//!         "flush",
//!         |owner, _args| async move { owner.flush().await },
//!     );
//!
//!     let handle = SchedulerBuilder::new()
//!         .worker_count(5)
//!         .submit(flush)
//!         .build()
//!         .start()
//!         .await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

// Re-export core types
pub use cadence_runtime::{
    DiscoveredJob, DispatchHook, ExecutionBridge, ExecutionContext, FirstRun, HookChain, JobError,
    JobKey, ParameterRegistry, ResolvedArgs, ScheduleDescriptor, ScheduledOwner, Scheduler,
    SchedulerBuilder, SchedulerError, SchedulerHandle, TriggerSpec,
};

// Make the runtime available in full
pub use cadence_runtime;

// Re-export commonly used types
pub use tokio_cron_scheduler::JobScheduler;
