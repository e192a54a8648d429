use crate::error::JobError;
use crate::registry::JobKey;
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Callback pair wrapping every job execution, used for cross-cutting
/// setup and teardown such as opening and committing a resource
/// session.
///
/// Hooks are shared by all jobs and may be entered concurrently by
/// distinct in-flight executions; the chain does not serialize them.
/// State spanning one execution belongs in the [`ExecutionContext`],
/// not in hook fields.
pub trait DispatchHook: Send + Sync {
    /// Runs before the target method, in registration order.
    fn before(&self, ctx: &mut ExecutionContext);

    /// Runs after the target method, in the same order, regardless of
    /// the invocation outcome. `failure` carries the captured error
    /// when the target method failed.
    fn after(&self, ctx: &mut ExecutionContext, failure: Option<&JobError>);
}

/// Per-execution value store threaded through the hook chain. A hook
/// typically puts its session in `before()` and takes it back in
/// `after()`.
pub struct ExecutionContext {
    job: JobKey,
    fired_at: DateTime<Utc>,
    values: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl ExecutionContext {
    pub(crate) fn new(job: JobKey) -> Self {
        Self {
            job,
            fired_at: Utc::now(),
            values: HashMap::new(),
        }
    }

    pub fn job(&self) -> JobKey {
        self.job
    }

    pub fn fired_at(&self) -> DateTime<Utc> {
        self.fired_at
    }

    /// Store a value keyed by its type, replacing any previous one.
    pub fn put<T: Send + 'static>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Remove and return the stored value of type `T`.
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

/// Ordered hook set, fixed at configuration time and shared by every
/// job for the process lifetime.
#[derive(Clone)]
pub struct HookChain {
    hooks: Arc<[Arc<dyn DispatchHook>]>,
}

impl Default for HookChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HookChain {
    pub fn new(hooks: Vec<Arc<dyn DispatchHook>>) -> Self {
        Self {
            hooks: hooks.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn run_before(&self, ctx: &mut ExecutionContext) {
        for hook in self.hooks.iter() {
            hook.before(ctx);
        }
    }

    pub(crate) fn run_after(&self, ctx: &mut ExecutionContext, failure: Option<&JobError>) {
        for hook in self.hooks.iter() {
            hook.after(ctx, failure);
        }
    }
}
