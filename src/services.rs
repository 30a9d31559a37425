//! Flat service store shared by modules, checks, and handlers.
//!
//! Providers register values by concrete type or by named token during
//! materialization; the map is then frozen behind an `Arc` and handed to
//! the `App`, so request handlers only ever see an immutable view. This is
//! deliberately a flat map, not a dependency-injection container.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type AnyService = Arc<dyn Any + Send + Sync>;

/// Type- and token-keyed store of shared services.
#[derive(Default)]
pub struct ServiceMap {
    by_type: HashMap<TypeId, AnyService>,
    by_token: HashMap<String, Vec<AnyService>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value under its concrete type. Last write wins.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.by_type.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Register an already-shared value under its concrete type.
    pub fn insert_arc<T: Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.by_type.insert(TypeId::of::<T>(), value);
    }

    /// Append a value under a named token. Tokens accumulate in
    /// registration order; they are never overwritten.
    pub fn insert_named<T: Send + Sync + 'static>(&mut self, token: impl Into<String>, value: T) {
        self.by_token
            .entry(token.into())
            .or_default()
            .push(Arc::new(value));
    }

    /// Resolve a value by concrete type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|any| any.downcast::<T>().ok())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// All values registered under a token, in registration order.
    pub fn get_named<T: Send + Sync + 'static>(&self, token: &str) -> Vec<Arc<T>> {
        self.by_token
            .get(token)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|any| any.clone().downcast::<T>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn token_count(&self, token: &str) -> usize {
        self.by_token.get(token).map_or(0, |v| v.len())
    }
}

impl std::fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMap")
            .field("types", &self.by_type.len())
            .field("tokens", &self.by_token.keys().collect::<Vec<_>>())
            .finish()
    }
}
