use crate::error::SchedulerError;
use crate::job::MethodFn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Stable identity of one scheduled method: owning-type simple name
/// plus method name, `Owner#method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    owner: &'static str,
    method: &'static str,
}

impl JobKey {
    pub fn new(owner: &'static str, method: &'static str) -> Self {
        Self { owner, method }
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Trigger identity paired with this job, for log correlation.
    pub fn trigger_id(&self) -> String {
        format!("{self}@Trigger")
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.method)
    }
}

/// One registered job: the shared owner instance and the invocable
/// handle bound at registration time, plus the declared parameter
/// types resolved per execution.
pub struct JobBinding {
    pub(crate) owner: Arc<dyn Any + Send + Sync>,
    pub(crate) method: MethodFn,
    pub(crate) param_types: Vec<TypeId>,
}

impl fmt::Debug for JobBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobBinding")
            .field("param_types", &self.param_types)
            .finish_non_exhaustive()
    }
}

/// Key to binding map. Filled during the registration phase, read-only
/// afterwards, so execution-time lookups need no locking.
#[derive(Debug, Default)]
pub struct JobRegistry {
    entries: HashMap<JobKey, JobBinding>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `key`. A colliding key
    /// replaces the earlier binding without an error.
    pub fn register(&mut self, key: JobKey, binding: JobBinding) {
        if self.entries.insert(key, binding).is_some() {
            warn!(job = %key, "replacing existing binding for job key");
        }
    }

    /// A miss means the engine presented a key that was never
    /// registered, an internal-consistency violation.
    pub fn lookup(&self, key: &JobKey) -> Result<&JobBinding, SchedulerError> {
        self.entries
            .get(key)
            .ok_or(SchedulerError::UnknownJob(*key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobFuture;

    fn noop_binding(tag: &'static str) -> JobBinding {
        JobBinding {
            owner: Arc::new(tag),
            method: Arc::new(|_, _| Box::pin(async { Ok(()) }) as JobFuture),
            param_types: Vec::new(),
        }
    }

    #[test]
    fn key_display_and_trigger_identity() {
        let key = JobKey::new("Foo", "bar");
        assert_eq!(key.to_string(), "Foo#bar");
        assert_eq!(key.trigger_id(), "Foo#bar@Trigger");
    }

    #[test]
    fn lookup_returns_registered_binding() {
        let mut registry = JobRegistry::new();
        let key = JobKey::new("Foo", "bar");
        registry.register(key, noop_binding("first"));
        assert!(registry.lookup(&key).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_miss_is_an_unknown_job_error() {
        let registry = JobRegistry::new();
        let err = registry.lookup(&JobKey::new("Foo", "bar")).unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownJob(_)));
        assert!(err.to_string().contains("Foo#bar"));
    }

    #[test]
    fn registry_and_binding_are_debug_printable() {
        let mut registry = JobRegistry::new();
        registry.register(JobKey::new("Foo", "bar"), noop_binding("first"));
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("JobBinding"));
        assert!(rendered.contains("param_types"));
    }

    #[test]
    fn colliding_key_replaces_without_error() {
        let mut registry = JobRegistry::new();
        let key = JobKey::new("Foo", "bar");
        registry.register(key, noop_binding("first"));
        registry.register(key, noop_binding("second"));
        assert_eq!(registry.len(), 1);
        let binding = registry.lookup(&key).unwrap();
        let owner = binding.owner.clone().downcast::<&'static str>().unwrap();
        assert_eq!(*owner, "second");
    }
}
