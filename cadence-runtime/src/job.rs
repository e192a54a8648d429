use crate::descriptor::ScheduleDescriptor;
use crate::error::JobError;
use crate::params::ResolvedArgs;
use crate::registry::JobKey;
use std::any::{Any, TypeId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a bound scheduled method.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), JobError>> + Send>>;

/// Invocable handle bound at registration time. Replaces runtime
/// reflection with a direct call through the shared owner instance.
pub(crate) type MethodFn =
    Arc<dyn Fn(Arc<dyn Any + Send + Sync>, ResolvedArgs) -> JobFuture + Send + Sync>;

pub(crate) type OwnerFactory =
    Arc<dyn Fn() -> Result<Arc<dyn Any + Send + Sync>, JobError> + Send + Sync>;

/// Owning type of scheduled methods. Constructed at most once per
/// process; every scheduled method on the type shares that instance
/// and may be entered concurrently by overlapping firings.
pub trait ScheduledOwner: Send + Sync + Sized + 'static {
    fn construct() -> Result<Self, JobError>;
}

/// One (descriptor, owning type, method) triple handed over by the
/// discovery collaborator, ready for registration.
pub struct DiscoveredJob {
    pub descriptor: ScheduleDescriptor,
    pub(crate) owner_type: &'static str,
    pub(crate) method_name: &'static str,
    pub(crate) factory: OwnerFactory,
    pub(crate) param_types: Vec<TypeId>,
    pub(crate) method: MethodFn,
}

impl DiscoveredJob {
    /// Bind `method` on owner type `T` under `method_name`. The closure
    /// receives the shared owner instance and the arguments resolved
    /// for this firing.
    pub fn new<T, F, Fut>(
        descriptor: ScheduleDescriptor,
        method_name: &'static str,
        method: F,
    ) -> Self
    where
        T: ScheduledOwner,
        F: Fn(Arc<T>, ResolvedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let factory: OwnerFactory = Arc::new(|| {
            T::construct().map(|owner| Arc::new(owner) as Arc<dyn Any + Send + Sync>)
        });
        let method: MethodFn = Arc::new(move |owner, args| {
            match owner.downcast::<T>() {
                Ok(typed) => Box::pin(method(typed, args)) as JobFuture,
                // Reachable only when two owning types share a simple
                // name and collide in the registration cache.
                Err(_) => Box::pin(async {
                    Err(JobError::from(format!(
                        "owner instance is not a {}",
                        std::any::type_name::<T>()
                    )))
                }),
            }
        });
        Self {
            descriptor,
            owner_type: simple_type_name::<T>(),
            method_name,
            factory,
            param_types: Vec::new(),
            method,
        }
    }

    /// Declare the next parameter of the target method, resolved per
    /// execution against the parameter registry.
    pub fn param<P: Send + Sync + 'static>(mut self) -> Self {
        self.param_types.push(TypeId::of::<P>());
        self
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(self.owner_type, self.method_name)
    }
}

/// Simple name of `T`, without the module path.
pub(crate) fn simple_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
