//! End-to-end auto-discovery: components self-register through the macros
//! at program start, the scan finds their source file, and materialization
//! mounts the handler and registers the injectable.
//!
//! The scan matches registered components by trailing path components of
//! `file!()`, so the fixture tree mirrors this file's path.

use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use armature::modules::ModuleDescriptor;
use armature::{register_handler, register_injectable, AppBootstrapper, Controller};

#[derive(Default)]
struct WidgetsController;

impl Controller for WidgetsController {
    fn name(&self) -> &str {
        "WidgetsController"
    }

    fn base_path(&self) -> &str {
        "/widgets"
    }

    fn routes(&self) -> Router {
        Router::new().route("/", get(|| async { "widgets" }))
    }
}

register_handler!(WidgetsController, "/widgets");

#[derive(Debug, Default)]
struct WidgetRepository {
    capacity: usize,
}

register_injectable!(WidgetRepository);

/// Fixture tree whose trailing components match this file's `file!()`.
fn fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("tests")).unwrap();
    fs::write(dir.path().join("tests/discovery.rs"), "// fixture").unwrap();
    dir
}

#[tokio::test]
async fn discovered_components_are_wired_into_the_app() {
    let dir = fixture_tree();

    let app = AppBootstrapper::new(ModuleDescriptor::new("app"))
        .with_auto_discovery(dir.path())
        .materialize()
        .await
        .unwrap()
        .into_app();

    let repo = app.services().get::<WidgetRepository>().unwrap();
    assert_eq!(repo.capacity, 0);

    let response = app
        .into_router()
        .oneshot(
            Request::builder()
                .uri("/widgets/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn scan_of_an_unrelated_tree_discovers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("other.rs"), "// fixture").unwrap();

    let app = AppBootstrapper::new(ModuleDescriptor::new("app"))
        .with_auto_discovery(dir.path())
        .materialize()
        .await
        .unwrap()
        .into_app();

    assert!(!app.services().contains::<WidgetRepository>());
}

#[tokio::test]
async fn discovered_handlers_coexist_with_explicit_controllers() {
    struct ManualController;

    impl Controller for ManualController {
        fn name(&self) -> &str {
            "ManualController"
        }

        fn base_path(&self) -> &str {
            "/manual"
        }

        fn routes(&self) -> Router {
            Router::new().route("/", get(|| async { "manual" }))
        }
    }

    let dir = fixture_tree();

    let router = AppBootstrapper::new(ModuleDescriptor::new("app"))
        .with_auto_discovery(dir.path())
        .with_controller(Arc::new(ManualController))
        .materialize()
        .await
        .unwrap()
        .into_app()
        .into_router();

    for uri in ["/widgets/", "/manual/"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}
