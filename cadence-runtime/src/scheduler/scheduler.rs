use super::handle::SchedulerHandle;
use crate::bridge::ExecutionBridge;
use crate::config::resolve_config_value;
use crate::descriptor::ScheduleDescriptor;
use crate::error::SchedulerError;
use crate::hook::HookChain;
use crate::job::DiscoveredJob;
use crate::params::ParameterRegistry;
use crate::registry::{JobBinding, JobKey, JobRegistry};
use crate::trigger::{FireSchedule, TriggerSpec, JOB_GROUP_NAME, TRIGGER_GROUP_NAME};
use chrono::Utc;
use config::Config;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Configured scheduler ready to start. Holds the hook chain,
/// parameter providers and submitted jobs but has not touched the
/// engine yet.
pub struct Scheduler {
    pub(crate) config: Arc<Config>,
    pub(crate) worker_count: usize,
    pub(crate) hooks: HookChain,
    pub(crate) params: Arc<ParameterRegistry>,
    pub(crate) jobs: Vec<DiscoveredJob>,
}

impl Scheduler {
    /// Register every submitted job and start the engine.
    ///
    /// Registration-time errors (descriptor validation, owner
    /// construction, engine rejection) are structural and abort
    /// startup; nothing runs partially registered. Returns a
    /// [`SchedulerHandle`] used to shut everything down.
    pub async fn start(self) -> Result<SchedulerHandle, SchedulerError> {
        let (registry, triggers) = Self::register_jobs(self.jobs, &self.config)?;
        info!(jobs = registry.len(), "Starting scheduler");

        let bridge = Arc::new(ExecutionBridge::new(
            Arc::new(registry),
            self.params,
            self.hooks,
            self.worker_count,
        ));

        let mut engine = JobScheduler::new().await?;
        let mut interval_handles = Vec::new();
        let mut first_runs = Vec::new();

        for (key, trigger) in triggers {
            info!(
                job = %key,
                group = JOB_GROUP_NAME,
                trigger = %key.trigger_id(),
                trigger_group = TRIGGER_GROUP_NAME,
                "Registering trigger"
            );
            match trigger.schedule {
                FireSchedule::Cron(expr) => {
                    let bridge = bridge.clone();
                    let job = Job::new_async(expr.as_str(), move |_uuid, _lock| {
                        let bridge = bridge.clone();
                        Box::pin(async move {
                            dispatch(bridge, key).await;
                        })
                    })?;
                    engine.add(job).await?;
                    if trigger.start_immediately {
                        first_runs.push(key);
                    }
                }
                FireSchedule::FixedRate(period) => {
                    let bridge = bridge.clone();
                    // A trigger that does not start immediately carries
                    // its first fire time in `start_at`.
                    let start_delay = trigger
                        .start_at
                        .map(|at| (at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
                        .unwrap_or(Duration::ZERO);
                    interval_handles.push(tokio::spawn(async move {
                        if !start_delay.is_zero() {
                            tokio::time::sleep(start_delay).await;
                        }
                        let mut ticker = tokio::time::interval(period);
                        ticker.tick().await;
                        loop {
                            let bridge = bridge.clone();
                            tokio::spawn(async move {
                                dispatch(bridge, key).await;
                            });
                            ticker.tick().await;
                        }
                    }));
                }
            }
        }

        engine.start().await?;

        // One-off first run for cron triggers that asked for it; fixed
        // triggers cover theirs through the interval loop above.
        for key in first_runs {
            let bridge = bridge.clone();
            tokio::spawn(async move {
                dispatch(bridge, key).await;
            });
        }

        info!("Scheduler started");
        Ok(SchedulerHandle {
            engine,
            interval_handles,
            bridge,
        })
    }

    /// Build the registry and trigger list from the submitted jobs,
    /// failing fast on the first invalid descriptor or owner that
    /// cannot be constructed.
    pub(crate) fn register_jobs(
        jobs: Vec<DiscoveredJob>,
        config: &Config,
    ) -> Result<(JobRegistry, Vec<(JobKey, TriggerSpec)>), SchedulerError> {
        let mut registry = JobRegistry::new();
        let mut triggers = Vec::with_capacity(jobs.len());
        // Owner instances are cached by type simple name for the
        // registration phase only; every method on a type shares the
        // one instance created here. The cache dies with this scope,
        // before the engine starts.
        let mut owner_cache: HashMap<&'static str, Arc<dyn Any + Send + Sync>> = HashMap::new();

        for job in jobs {
            let key = job.key();
            let descriptor = Self::resolve_descriptor(job.descriptor, config)?;
            let trigger = TriggerSpec::resolve(&descriptor, key.owner(), key.method(), Utc::now())?;

            let owner = match owner_cache.get(key.owner()) {
                Some(owner) => owner.clone(),
                None => {
                    let owner = (job.factory)().map_err(|source| {
                        SchedulerError::OwnerConstruction {
                            owner: key.owner().to_string(),
                            source,
                        }
                    })?;
                    owner_cache.insert(key.owner(), owner.clone());
                    owner
                }
            };

            registry.register(
                key,
                JobBinding {
                    owner,
                    method: job.method,
                    param_types: job.param_types,
                },
            );
            triggers.push((key, trigger));
        }

        Ok((registry, triggers))
    }

    /// Resolve config placeholders in the cron expression, if any.
    fn resolve_descriptor(
        mut descriptor: ScheduleDescriptor,
        config: &Config,
    ) -> Result<ScheduleDescriptor, SchedulerError> {
        if let Some(expr) = descriptor.cron.take() {
            let resolved = resolve_config_value(&expr, config)
                .map_err(|source| SchedulerError::Config { value: expr.clone(), source })?;
            descriptor.cron = Some(resolved);
        }
        Ok(descriptor)
    }
}

/// Engine callback: execution failures were already contained by the
/// bridge, so the only error left is an unknown key.
async fn dispatch(bridge: Arc<ExecutionBridge>, key: JobKey) {
    if let Err(err) = bridge.execute(key).await {
        error!(job = %key, error = %err, "Dropping firing for unregistered job key");
    }
}
