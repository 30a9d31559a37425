//! Component auto-discovery.
//!
//! Discoverable types self-register into a global registry at program
//! start (via the [`crate::register_handler!`] and
//! [`crate::register_injectable!`] macros); the scanner walks a source
//! tree and classifies the registered components whose source files it
//! finds. There is no runtime reflection: the "routing path" and
//! "injectable" markers are explicit fields of the registration.

pub mod registry;
pub mod scanner;

pub use registry::{register_component, ComponentRecord, ComponentRegistry};
pub use scanner::{scan, scan_with, ComponentSource, DiscoveredComponents, RegistrySource};
