//! Configuration validation starter.
//!
//! Resolves a [`FromEnvConfig`] struct from the environment, validates it,
//! and registers it as a shared service. Failures are configuration-time
//! errors that abort bootstrap through the top-level handler.

use std::sync::Arc;

use crate::config::FromEnvConfig;
use crate::modules::ModuleDescriptor;

/// Build a config validation module for `T`.
pub fn config_module<T: FromEnvConfig>() -> ModuleDescriptor {
    ModuleDescriptor::new(format!("config:{}", std::any::type_name::<T>())).with_provider(
        |services| {
            let config = T::from_env()?;
            config.validate()?;
            services.insert_arc(Arc::new(config));
            Ok(())
        },
    )
}
