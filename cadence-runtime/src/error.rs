use crate::registry::JobKey;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Failure produced by a scheduled method (or unwrapped from a panic).
/// Captured by the execution bridge and delivered to the hook chain,
/// never re-raised toward the engine.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Registration-time and engine-level errors. All of these abort
/// startup; none of them occur once the engine is running, except
/// [`SchedulerError::UnknownJob`] which marks an internal-consistency
/// violation in the engine callback.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("missing schedule expression: {owner}#{method}")]
    MissingExpression { owner: String, method: String },

    #[error("both cron and fixed interval set: {owner}#{method}")]
    AmbiguousSchedule { owner: String, method: String },

    #[error("the fixed interval cannot be less than 1 '{value}': {owner}#{method}")]
    InvalidInterval {
        value: u64,
        owner: String,
        method: String,
    },

    #[error("failed to construct owner type '{owner}'")]
    OwnerConstruction {
        owner: String,
        #[source]
        source: JobError,
    },

    #[error("failed to resolve config placeholder '{value}'")]
    Config {
        value: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("scheduling engine error")]
    Engine(#[from] JobSchedulerError),

    #[error("no job registered for key '{0}'")]
    UnknownJob(JobKey),
}
