//! Cadence Runtime - core runtime for the scheduling facade
//!
//! This crate turns (descriptor, owning type, method) triples handed
//! over by a discovery collaborator into registered jobs on an
//! external scheduling engine, and dispatches every engine firing
//! through a configurable chain of before/after hooks.

mod bridge;
mod config;
mod descriptor;
mod error;
mod hook;
mod job;
mod params;
mod registry;
mod scheduler;
mod trigger;

// Re-export public API
pub use bridge::{ExecutionBridge, ExecutionCancelled, ExecutionPanic};
pub use config::{
    load_toml_config, load_yaml_config, resolve_config_value, scheduler_settings,
    SchedulerSettings,
};
pub use descriptor::{FirstRun, ScheduleDescriptor};
pub use error::{JobError, SchedulerError};
pub use hook::{DispatchHook, ExecutionContext, HookChain};
pub use job::{DiscoveredJob, JobFuture, ScheduledOwner};
pub use params::{ParameterRegistry, ResolvedArgs};
pub use registry::{JobBinding, JobKey, JobRegistry};
pub use scheduler::{Scheduler, SchedulerBuilder, SchedulerHandle, DEFAULT_WORKER_COUNT};
pub use trigger::{FireSchedule, TriggerSpec, JOB_GROUP_NAME, TRIGGER_GROUP_NAME};
