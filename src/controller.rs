//! Controller trait: a type that answers requests at a declared base path.

use axum::Router;

/// A route handler discovered or registered explicitly.
///
/// Controllers contribute a sub-router mounted under their base path when
/// the composition root is instantiated. Auto-discovered controllers are
/// constructed through the component registry; explicit ones are passed to
/// the builder as trait objects.
pub trait Controller: Send + Sync {
    /// Type name, used for logging and de-duplication.
    fn name(&self) -> &str;

    /// Path the controller's routes are nested under. Must start with `/`.
    fn base_path(&self) -> &str;

    /// The controller's routes, relative to `base_path`.
    fn routes(&self) -> Router;
}
