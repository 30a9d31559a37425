//! End-to-end bootstrap tests: builder through materialization, with a
//! recording network adapter instead of real sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use armature::config::ConfigError;
use armature::errors::{BootstrapError, BootstrapResult};
use armature::health::HealthOptions;
use armature::metrics::MetricsOptions;
use armature::modules::ModuleDescriptor;
use armature::openapi::SwaggerOptions;
use armature::server::{BoundListener, NetworkAdapter};
use armature::{App, AppBootstrapper, Controller, Plugin};

// --- fixtures ---

struct PingController;

impl Controller for PingController {
    fn name(&self) -> &str {
        "PingController"
    }

    fn base_path(&self) -> &str {
        "/ping"
    }

    fn routes(&self) -> Router {
        Router::new().route("/", get(|| async { "pong" }))
    }
}

/// Adapter that records bind calls and serves nothing.
#[derive(Clone, Default)]
struct RecordingAdapter {
    bound_to: Arc<Mutex<Vec<SocketAddr>>>,
    served: Arc<AtomicBool>,
}

struct RecordingBound {
    addr: SocketAddr,
    served: Arc<AtomicBool>,
}

#[async_trait]
impl NetworkAdapter for RecordingAdapter {
    async fn bind(&self, addr: SocketAddr) -> BootstrapResult<Box<dyn BoundListener>> {
        self.bound_to.lock().unwrap().push(addr);
        Ok(Box::new(RecordingBound {
            addr,
            served: self.served.clone(),
        }))
    }
}

#[async_trait]
impl BoundListener for RecordingBound {
    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    async fn serve(self: Box<Self>, _router: Router, _graceful: bool) -> BootstrapResult<()> {
        self.served.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Plugin that appends its name to a shared log, optionally after a delay,
/// optionally failing.
struct ProbePlugin {
    name: &'static str,
    delay: Duration,
    fail: bool,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Plugin for ProbePlugin {
    fn name(&self) -> &str {
        self.name
    }

    async fn apply(&self, _app: &mut App) -> BootstrapResult<()> {
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(self.name);
        if self.fail {
            return Err(BootstrapError::startup("probe exploded"));
        }
        Ok(())
    }
}

fn builder() -> AppBootstrapper {
    AppBootstrapper::new(ModuleDescriptor::new("app"))
}

async fn status_of(router: Router, uri: &str) -> StatusCode {
    router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

// --- materialization ---

#[tokio::test]
async fn global_prefix_moves_all_routes_under_the_prefix() {
    let app = builder()
        .with_global_prefix("api")
        .with_controller(Arc::new(PingController))
        .materialize()
        .await
        .unwrap()
        .into_app()
        .into_router();

    assert_eq!(status_of(app.clone(), "/api/ping/").await, StatusCode::OK);
    assert_eq!(status_of(app, "/ping/").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_metrics_and_docs_routes_are_mounted() {
    let app = builder()
        .with_health(HealthOptions::default())
        .with_metrics(MetricsOptions::default())
        .with_swagger(SwaggerOptions::new("Probe API", "1.0"))
        .materialize()
        .await
        .unwrap()
        .into_app()
        .into_router();

    assert_eq!(status_of(app.clone(), "/health").await, StatusCode::OK);
    assert_eq!(status_of(app.clone(), "/metrics").await, StatusCode::OK);
    assert_eq!(status_of(app, "/docs").await, StatusCode::OK);
}

#[tokio::test]
async fn metrics_observe_routes_mounted_by_later_modules() {
    use http_body_util::BodyExt;

    // Metrics first, then health and a setup-action route and docs: every
    // one of them must still produce observations.
    let router = builder()
        .with_metrics(MetricsOptions::default())
        .with_health(HealthOptions::default())
        .with_setup(|app| {
            app.route("/late", get(|| async { "late" }));
        })
        .with_swagger(SwaggerOptions::new("Probe API", "1.0"))
        .materialize()
        .await
        .unwrap()
        .into_app()
        .into_router();

    for uri in ["/health", "/late", "/docs"] {
        assert_eq!(status_of(router.clone(), uri).await, StatusCode::OK, "{uri}");
    }

    let response = router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let exposition = String::from_utf8(body.to_vec()).unwrap();
    for route in ["/health", "/late", "/docs"] {
        assert!(
            exposition.contains(&format!("route=\"{route}\"")),
            "no observation for {route}; exposition:\n{exposition}"
        );
    }
}

#[tokio::test]
async fn versioning_stamps_responses() {
    let router = builder()
        .with_versioning(Default::default())
        .with_controller(Arc::new(PingController))
        .materialize()
        .await
        .unwrap()
        .into_app()
        .into_router();

    let response = router
        .oneshot(Request::builder().uri("/ping/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-api-version").unwrap(), "1");
}

#[tokio::test]
async fn setup_actions_run_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let first = order.clone();
    let second = order.clone();

    let app = builder()
        .with_setup(move |app| {
            first.lock().unwrap().push("routes");
            app.route("/a", get(|| async { "first" }));
        })
        .with_setup(move |app| {
            second.lock().unwrap().push("layers");
            app.route("/b", get(|| async { "second" }));
        })
        .materialize()
        .await
        .unwrap()
        .into_app()
        .into_router();

    assert_eq!(*order.lock().unwrap(), vec!["routes", "layers"]);
    assert_eq!(status_of(app.clone(), "/a").await, StatusCode::OK);
    assert_eq!(status_of(app, "/b").await, StatusCode::OK);
}

#[tokio::test]
async fn import_order_is_root_then_features_in_registration_order() {
    let materialized = builder()
        .with_module(ModuleDescriptor::new("database"))
        .with_module(ModuleDescriptor::new("cache"))
        .with_module(ModuleDescriptor::new("health"))
        .materialize()
        .await
        .unwrap();
    assert_eq!(
        materialized.import_names(),
        &["app", "database", "cache", "health"]
    );
}

// --- plugins ---

#[tokio::test]
async fn plugins_run_sequentially_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    // The first plugin is slow; with any concurrency the fast second
    // plugin would log first.
    builder()
        .with_plugin(ProbePlugin {
            name: "slow",
            delay: Duration::from_millis(50),
            fail: false,
            log: log.clone(),
        })
        .with_plugin(ProbePlugin {
            name: "fast",
            delay: Duration::ZERO,
            fail: false,
            log: log.clone(),
        })
        .materialize()
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
}

#[tokio::test]
async fn failing_plugin_aborts_the_remaining_plugins() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let err = builder()
        .with_plugin(ProbePlugin {
            name: "broken",
            delay: Duration::ZERO,
            fail: true,
            log: log.clone(),
        })
        .with_plugin(ProbePlugin {
            name: "after",
            delay: Duration::ZERO,
            fail: false,
            log: log.clone(),
        })
        .materialize()
        .await
        .unwrap_err();

    match err {
        BootstrapError::PluginFailed { plugin, .. } => assert_eq!(plugin, "broken"),
        other => panic!("expected PluginFailed, got {other:?}"),
    }
    assert_eq!(*log.lock().unwrap(), vec!["broken"]);
}

// --- launch ---

#[tokio::test]
async fn listen_binds_the_configured_port_and_serves() {
    let adapter = RecordingAdapter::default();
    let bound_to = adapter.bound_to.clone();
    let served = adapter.served.clone();

    AppBootstrapper::with_adapter(ModuleDescriptor::new("app"), Box::new(adapter))
        .with_port(9321)
        .listen()
        .await
        .unwrap();

    let expected: SocketAddr = "0.0.0.0:9321".parse().unwrap();
    assert_eq!(*bound_to.lock().unwrap(), vec![expected]);
    assert!(served.load(Ordering::SeqCst));
}

#[tokio::test]
async fn failed_materialization_never_touches_the_network() {
    let adapter = RecordingAdapter::default();
    let bound_to = adapter.bound_to.clone();

    let failing = ModuleDescriptor::new("broken")
        .with_provider(|_| Err(ConfigError::validation_failed("bad config")));

    let result = armature::try_launch(
        ModuleDescriptor::new("app"),
        Some(Box::new(adapter)),
        |app| app.with_module(failing),
    )
    .await;

    assert!(matches!(result, Err(BootstrapError::Configuration(_))));
    assert!(bound_to.lock().unwrap().is_empty());
}

#[tokio::test]
async fn panicking_configure_callback_is_reported_not_propagated() {
    let result = armature::try_launch(ModuleDescriptor::new("app"), None, |_| {
        panic!("bad callback")
    })
    .await;

    match result {
        Err(BootstrapError::CallbackPanicked { message }) => {
            assert!(message.contains("bad callback"));
        }
        other => panic!("expected CallbackPanicked, got {:?}", other.err()),
    }
}
