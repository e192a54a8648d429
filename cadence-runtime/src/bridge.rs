use crate::error::{JobError, SchedulerError};
use crate::hook::{ExecutionContext, HookChain};
use crate::params::ParameterRegistry;
use crate::registry::{JobKey, JobRegistry};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::debug;

/// Failure recorded when a scheduled method panics instead of
/// returning an error.
#[derive(Debug, Error)]
#[error("job panicked: {0}")]
pub struct ExecutionPanic(pub String);

#[derive(Debug, Error)]
#[error("job was cancelled before completion")]
pub struct ExecutionCancelled;

/// Callback target of the scheduling engine. Looks up the binding for
/// the fired key, wraps the invocation in the hook chain and contains
/// every execution failure: the engine always observes a completed
/// execution, and failures are visible only to the hooks.
pub struct ExecutionBridge {
    registry: Arc<JobRegistry>,
    params: Arc<ParameterRegistry>,
    hooks: HookChain,
    workers: Semaphore,
}

impl ExecutionBridge {
    pub(crate) fn new(
        registry: Arc<JobRegistry>,
        params: Arc<ParameterRegistry>,
        hooks: HookChain,
        worker_count: usize,
    ) -> Self {
        Self {
            registry,
            params,
            hooks,
            workers: Semaphore::new(worker_count),
        }
    }

    /// Stop accepting firings. Called at shutdown; permits already
    /// handed out run to completion.
    pub(crate) fn close(&self) {
        self.workers.close();
    }

    /// Run one firing of `key`. The only error that comes back is
    /// [`SchedulerError::UnknownJob`], an internal-consistency
    /// violation; target-method failures are captured and handed to
    /// the hook chain instead.
    pub async fn execute(&self, key: JobKey) -> Result<(), SchedulerError> {
        let _permit = match self.workers.acquire().await {
            Ok(permit) => permit,
            // Pool closed at shutdown; the firing is dropped.
            Err(_) => return Ok(()),
        };

        let binding = self.registry.lookup(&key)?;
        debug!("execute the method [{}()]", key);

        let mut ctx = ExecutionContext::new(key);
        self.hooks.run_before(&mut ctx);

        let args = self.params.resolve_all(&binding.param_types);
        let invocation = (binding.method)(binding.owner.clone(), args);
        let failure = match tokio::spawn(invocation).await {
            Ok(Ok(())) => None,
            Ok(Err(cause)) => Some(cause),
            Err(join) => Some(unwrap_join_failure(join)),
        };

        self.hooks.run_after(&mut ctx, failure.as_ref());
        Ok(())
    }
}

/// Unwrap the task-join layer around a failed invocation to get at the
/// real cause.
fn unwrap_join_failure(join: JoinError) -> JobError {
    if join.is_panic() {
        let payload = join.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Box::new(ExecutionPanic(message))
    } else {
        Box::new(ExecutionCancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScheduleDescriptor;
    use crate::hook::DispatchHook;
    use crate::job::{DiscoveredJob, ScheduledOwner};
    use crate::registry::JobBinding;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Target;

    impl ScheduledOwner for Target {
        fn construct() -> Result<Self, JobError> {
            Ok(Target)
        }
    }

    struct Recorder {
        name: &'static str,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl DispatchHook for Recorder {
        fn before(&self, _ctx: &mut ExecutionContext) {
            self.events.lock().unwrap().push(format!("{}.before", self.name));
        }

        fn after(&self, _ctx: &mut ExecutionContext, failure: Option<&JobError>) {
            let suffix = failure.map(|e| e.to_string()).unwrap_or_else(|| "none".into());
            self.events
                .lock()
                .unwrap()
                .push(format!("{}.after({suffix})", self.name));
        }
    }

    fn bridge_for(
        job: DiscoveredJob,
        params: ParameterRegistry,
        hooks: HookChain,
        worker_count: usize,
    ) -> (ExecutionBridge, JobKey) {
        let key = job.key();
        let mut registry = JobRegistry::new();
        let owner = (job.factory)().unwrap();
        registry.register(
            key,
            JobBinding {
                owner,
                method: job.method,
                param_types: job.param_types,
            },
        );
        (
            ExecutionBridge::new(Arc::new(registry), Arc::new(params), hooks, worker_count),
            key,
        )
    }

    fn recorders(events: &Arc<Mutex<Vec<String>>>) -> HookChain {
        HookChain::new(vec![
            Arc::new(Recorder { name: "h1", events: events.clone() }),
            Arc::new(Recorder { name: "h2", events: events.clone() }),
        ])
    }

    #[tokio::test]
    async fn failure_reaches_every_hook_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let job = DiscoveredJob::new::<Target, _, _>(
            ScheduleDescriptor::fixed(1000),
            "explode",
            |_owner, _args| async { Err(JobError::from("boom")) },
        );
        let (bridge, key) = bridge_for(job, ParameterRegistry::new(), recorders(&events), 5);

        bridge.execute(key).await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["h1.before", "h2.before", "h1.after(boom)", "h2.after(boom)"]
        );
    }

    #[tokio::test]
    async fn success_reaches_hooks_with_no_failure() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let job = DiscoveredJob::new::<Target, _, _>(
            ScheduleDescriptor::fixed(1000),
            "work",
            |_owner, _args| async { Ok(()) },
        );
        let (bridge, key) = bridge_for(job, ParameterRegistry::new(), recorders(&events), 5);

        bridge.execute(key).await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["h1.before", "h2.before", "h1.after(none)", "h2.after(none)"]
        );
    }

    fn blow_up() -> Result<(), JobError> {
        panic!("it broke")
    }

    #[tokio::test]
    async fn panic_is_unwrapped_and_contained() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let job = DiscoveredJob::new::<Target, _, _>(
            ScheduleDescriptor::fixed(1000),
            "panic",
            |_owner, _args| async { blow_up() },
        );
        let (bridge, key) = bridge_for(job, ParameterRegistry::new(), recorders(&events), 5);

        // The bridge itself completes normally.
        bridge.execute(key).await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events[2], "h1.after(job panicked: it broke)");
        assert_eq!(events[3], "h2.after(job panicked: it broke)");
    }

    #[tokio::test]
    async fn unknown_key_is_a_consistency_error() {
        let bridge = ExecutionBridge::new(
            Arc::new(JobRegistry::new()),
            Arc::new(ParameterRegistry::new()),
            HookChain::default(),
            5,
        );
        let err = bridge.execute(JobKey::new("Ghost", "run")).await.unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownJob(_)));
    }

    struct Dao {
        hits: AtomicUsize,
    }

    #[tokio::test]
    async fn declared_params_resolve_against_the_registry() {
        let mut params = ParameterRegistry::new();
        params.provide(Dao { hits: AtomicUsize::new(0) });

        let seen_missing = Arc::new(AtomicUsize::new(0));
        let seen_missing_in_job = seen_missing.clone();
        let job = DiscoveredJob::new::<Target, _, _>(
            ScheduleDescriptor::fixed(1000),
            "persist",
            move |_owner, args| {
                let seen_missing = seen_missing_in_job.clone();
                async move {
                    let dao = args.get::<Dao>(0).ok_or("dao not resolved")?;
                    dao.hits.fetch_add(1, Ordering::SeqCst);
                    // A type with no provider resolves to an absent
                    // argument, not an error.
                    if args.get::<String>(1).is_none() {
                        seen_missing.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(())
                }
            },
        )
        .param::<Dao>()
        .param::<String>();

        let (bridge, key) = bridge_for(job, params, HookChain::default(), 5);
        bridge.execute(key).await.unwrap();

        assert_eq!(seen_missing.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn worker_pool_bounds_concurrent_executions() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let in_flight_job = in_flight.clone();
        let max_job = max_in_flight.clone();
        let runs_job = runs.clone();
        let job = DiscoveredJob::new::<Target, _, _>(
            ScheduleDescriptor::fixed(1000),
            "crawl",
            move |_owner, _args| {
                let in_flight = in_flight_job.clone();
                let max_in_flight = max_job.clone();
                let runs = runs_job.clone();
                async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        );

        let (bridge, key) = bridge_for(job, ParameterRegistry::new(), HookChain::default(), 2);
        let bridge = Arc::new(bridge);

        let mut firings = Vec::new();
        for _ in 0..6 {
            let bridge = bridge.clone();
            firings.push(tokio::spawn(async move { bridge.execute(key).await }));
        }
        for firing in firings {
            firing.await.unwrap().unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 6);
        assert!(
            max_in_flight.load(Ordering::SeqCst) <= 2,
            "in-flight executions exceeded the worker bound"
        );
    }

    #[tokio::test]
    async fn closed_worker_pool_drops_firings() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_job = runs.clone();
        let job = DiscoveredJob::new::<Target, _, _>(
            ScheduleDescriptor::fixed(1000),
            "late",
            move |_owner, _args| {
                let runs = runs_job.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        );
        let (bridge, key) = bridge_for(job, ParameterRegistry::new(), recorders(&events), 5);

        bridge.close();
        bridge.execute(key).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(events.lock().unwrap().is_empty(), "hooks must not run for a dropped firing");
    }
}
