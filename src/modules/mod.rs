//! Module descriptors: named units of providers and app install hooks.
//!
//! A module descriptor is what starter calls produce and what the
//! composition root imports. Provider setups run first (in import order)
//! against the mutable [`ServiceMap`]; install hooks run after the `App`
//! handle exists and may mount routes or layers.

pub mod composition;

pub use composition::CompositionRoot;

use crate::config::ConfigError;
use crate::server::App;
use crate::services::ServiceMap;

/// Deferred provider registration. Runs during materialization; failures
/// are configuration-time errors.
pub type ProviderSetup = Box<dyn FnOnce(&mut ServiceMap) -> Result<(), ConfigError> + Send>;

/// Deferred app wiring (routes, layers). Runs once the `App` exists.
pub type InstallSetup = Box<dyn FnOnce(&mut App) + Send>;

/// A named unit of composition: providers plus install hooks.
pub struct ModuleDescriptor {
    name: String,
    providers: Vec<ProviderSetup>,
    installs: Vec<InstallSetup>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: Vec::new(),
            installs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a provider setup, builder-style.
    pub fn with_provider(
        mut self,
        setup: impl FnOnce(&mut ServiceMap) -> Result<(), ConfigError> + Send + 'static,
    ) -> Self {
        self.providers.push(Box::new(setup));
        self
    }

    /// Append an install hook, builder-style.
    pub fn with_install(mut self, setup: impl FnOnce(&mut App) + Send + 'static) -> Self {
        self.installs.push(Box::new(setup));
        self
    }

    pub(crate) fn into_parts(self) -> (String, Vec<ProviderSetup>, Vec<InstallSetup>) {
        (self.name, self.providers, self.installs)
    }
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("providers", &self.providers.len())
            .field("installs", &self.installs.len())
            .finish()
    }
}
