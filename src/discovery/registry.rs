//! Global component registry for auto-discovery.
//!
//! Components register themselves at static initialization time (ctor)
//! with their source file, an optional routing path, an injectable marker,
//! and type-erased factories. The scanner consults the registry through
//! the default [`super::RegistrySource`].

use std::path::Path;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::controller::Controller;
use crate::services::ServiceMap;

/// One self-registered component.
#[derive(Clone, Copy)]
pub struct ComponentRecord {
    /// Type name, unique per component.
    pub type_name: &'static str,
    /// Source file the registration lives in (`file!()`).
    pub source_file: &'static str,
    /// Routing-path marker. Present iff the component is a handler.
    pub route_path: Option<&'static str>,
    /// Injectable marker.
    pub injectable: bool,
    /// Handler factory, present for handler components.
    pub build_handler: Option<fn() -> Arc<dyn Controller>>,
    /// Service registration, present for injectable components.
    pub register_service: Option<fn(&mut ServiceMap)>,
}

impl std::fmt::Debug for ComponentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRecord")
            .field("type_name", &self.type_name)
            .field("source_file", &self.source_file)
            .field("route_path", &self.route_path)
            .field("injectable", &self.injectable)
            .finish()
    }
}

/// Thread-safe registry of self-registered components.
#[derive(Default)]
pub struct ComponentRegistry {
    records: RwLock<Vec<ComponentRecord>>,
}

impl ComponentRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Register a component. Re-registration of the same type name is
    /// ignored so repeated test initialization stays benign.
    pub fn register(&self, record: ComponentRecord) {
        let mut records = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if records.iter().any(|r| r.type_name == record.type_name) {
            return;
        }
        tracing::debug!(
            component = record.type_name,
            file = record.source_file,
            "registered component"
        );
        records.push(record);
    }

    /// Records whose registered source file matches the scanned path.
    pub fn records_for_file(&self, path: &Path) -> Vec<ComponentRecord> {
        let records = match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records
            .iter()
            .filter(|r| paths_match(path, r.source_file))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        match self.records.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `file!()` paths are relative to the package root while scanned paths
/// may be absolute, so match on trailing path components.
fn paths_match(scanned: &Path, registered: &str) -> bool {
    let registered = Path::new(registered);
    let mut scanned_parts = scanned.components().rev();
    let mut registered_parts = registered.components().rev().peekable();
    if registered_parts.peek().is_none() {
        return false;
    }
    for part in registered_parts {
        match scanned_parts.next() {
            Some(scanned_part) if scanned_part == part => continue,
            _ => return false,
        }
    }
    true
}

/// Global registry instance, populated by the registration macros before
/// `main` runs.
pub static COMPONENT_REGISTRY: Lazy<ComponentRegistry> = Lazy::new(ComponentRegistry::new);

/// Register a component with the global registry.
pub fn register_component(record: ComponentRecord) {
    COMPONENT_REGISTRY.register(record);
}

/// Register a handler component at static initialization time.
///
/// The type must implement [`Controller`] and `Default`. Use once per
/// source file per handler type.
#[macro_export]
macro_rules! register_handler {
    ($ty:ty, $path:expr) => {
        const _: () = {
            #[::ctor::ctor]
            fn __armature_register_handler() {
                $crate::discovery::register_component($crate::discovery::ComponentRecord {
                    type_name: ::std::stringify!($ty),
                    source_file: ::std::file!(),
                    route_path: Some($path),
                    injectable: false,
                    build_handler: Some(|| {
                        ::std::sync::Arc::new(<$ty as ::std::default::Default>::default())
                    }),
                    register_service: None,
                });
            }
        };
    };
}

/// Register an injectable component at static initialization time.
///
/// The type must implement `Default` and be `Send + Sync`. Use once per
/// source file per injectable type.
#[macro_export]
macro_rules! register_injectable {
    ($ty:ty) => {
        const _: () = {
            #[::ctor::ctor]
            fn __armature_register_injectable() {
                $crate::discovery::register_component($crate::discovery::ComponentRecord {
                    type_name: ::std::stringify!($ty),
                    source_file: ::std::file!(),
                    route_path: None,
                    injectable: true,
                    build_handler: None,
                    register_service: Some(|services| {
                        services.insert(<$ty as ::std::default::Default>::default());
                    }),
                });
            }
        };
    };
}
