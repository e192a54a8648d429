use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from a declared parameter type to one shared provider
/// instance. Built once before the engine starts, read-only at
/// execution time.
#[derive(Default)]
pub struct ParameterRegistry {
    providers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instance` as the provider for its concrete type.
    pub fn provide<T: Send + Sync + 'static>(&mut self, instance: T) {
        self.providers.insert(TypeId::of::<T>(), Arc::new(instance));
    }

    /// A type with no provider resolves to `None`, not an error.
    pub fn resolve(&self, ty: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.providers.get(&ty).cloned()
    }

    pub(crate) fn resolve_all(&self, types: &[TypeId]) -> ResolvedArgs {
        ResolvedArgs(types.iter().map(|ty| self.resolve(*ty)).collect())
    }
}

/// Positional arguments resolved for one invocation; unresolvable
/// parameter types leave a `None` in their slot.
pub struct ResolvedArgs(pub(crate) Vec<Option<Arc<dyn Any + Send + Sync>>>);

impl ResolvedArgs {
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        self.0.get(index)?.as_ref()?.clone().downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
