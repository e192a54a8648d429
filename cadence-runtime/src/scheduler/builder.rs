use super::scheduler::Scheduler;
use crate::config::{load_toml_config, load_yaml_config, scheduler_settings};
use crate::hook::{DispatchHook, HookChain};
use crate::job::DiscoveredJob;
use crate::params::ParameterRegistry;
use config::Config;
use std::sync::Arc;
use tracing::info;

/// Worker pool size used when neither the builder nor the config set
/// one.
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// Builder for the scheduler: config source, worker concurrency, hook
/// chain, parameter providers and the jobs handed over by the
/// discovery collaborator.
pub struct SchedulerBuilder {
    config: Arc<Config>,
    worker_count: Option<usize>,
    hooks: Vec<Arc<dyn DispatchHook>>,
    params: ParameterRegistry,
    jobs: Vec<DiscoveredJob>,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default config (empty).
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create with TOML config file.
    ///
    /// # Panics
    ///
    /// Panics if the config file cannot be loaded or parsed.
    /// This is intentional as configuration errors should be caught
    /// early during setup.
    pub fn with_toml(path: &str) -> Self {
        let config = load_toml_config(path)
            .unwrap_or_else(|e| panic!("Failed to load TOML config from '{}': {}", path, e));
        Self::with_config(config)
    }

    /// Create with YAML config file.
    ///
    /// # Panics
    ///
    /// Panics if the config file cannot be loaded or parsed.
    pub fn with_yaml(path: &str) -> Self {
        let config = load_yaml_config(path)
            .unwrap_or_else(|e| panic!("Failed to load YAML config from '{}': {}", path, e));
        Self::with_config(config)
    }

    /// Create with custom config.
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            worker_count: None,
            hooks: Vec::new(),
            params: ParameterRegistry::new(),
            jobs: Vec::new(),
        }
    }

    /// Set the worker pool size. Takes precedence over the
    /// `scheduler.thread_count` config key.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn worker_count(mut self, count: usize) -> Self {
        assert!(count > 0, "worker count must be positive");
        self.worker_count = Some(count);
        self
    }

    /// Append a hook to the dispatch chain. Hooks run in the order
    /// they were added, around every job execution.
    pub fn hook(mut self, hook: Arc<dyn DispatchHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Register `instance` as the shared provider for its type when
    /// resolving target-method parameters.
    pub fn provide<T: Send + Sync + 'static>(mut self, instance: T) -> Self {
        self.params.provide(instance);
        self
    }

    /// Submit one discovered job for registration.
    pub fn submit(mut self, job: DiscoveredJob) -> Self {
        self.jobs.push(job);
        self
    }

    /// Submit every job produced by the discovery collaborator.
    pub fn submit_all(mut self, jobs: impl IntoIterator<Item = DiscoveredJob>) -> Self {
        self.jobs.extend(jobs);
        self
    }

    /// Build the scheduler (does not start it yet). Registration and
    /// engine errors surface from [`Scheduler::start`].
    pub fn build(self) -> Scheduler {
        let settings = scheduler_settings(&self.config);
        let worker_count = self.worker_count.unwrap_or(if settings.thread_count > 0 {
            settings.thread_count
        } else {
            DEFAULT_WORKER_COUNT
        });

        info!(
            jobs = self.jobs.len(),
            hooks = self.hooks.len(),
            worker_count,
            "Building scheduler"
        );

        Scheduler {
            config: self.config,
            worker_count,
            hooks: HookChain::new(self.hooks),
            params: Arc::new(self.params),
            jobs: self.jobs,
        }
    }
}
