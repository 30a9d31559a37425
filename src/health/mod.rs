//! Health endpoint module.
//!
//! One GET route returning an aggregate status assembled from the checks
//! the options enable: database reachability (only when a
//! [`DatabaseIndicator`] is registered; absence contributes nothing, not
//! a failure) and heap/resident memory thresholds (two checks whenever
//! memory options are given).

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use serde::Serialize;

use crate::config::ServerDefaults;
use crate::modules::ModuleDescriptor;
use crate::services::ServiceMap;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Health endpoint configuration.
#[derive(Debug, Clone)]
pub struct HealthOptions {
    /// Check database reachability when an indicator is registered.
    pub database: bool,
    /// Memory thresholds; `None` contributes no memory checks.
    pub memory: Option<MemoryOptions>,
    /// Route the endpoint is mounted at.
    pub path: String,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            database: false,
            memory: None,
            path: ServerDefaults::HEALTH_PATH.to_string(),
        }
    }
}

/// Memory thresholds in megabytes.
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    pub heap_mb: u64,
    pub rss_mb: u64,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            heap_mb: 200,
            rss_mb: 300,
        }
    }
}

/// Aggregate and per-check status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Outcome of one check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CheckOutcome {
    pub fn up(details: Option<serde_json::Value>) -> Self {
        Self {
            status: HealthStatus::Up,
            details,
        }
    }

    pub fn down(details: Option<serde_json::Value>) -> Self {
        Self {
            status: HealthStatus::Down,
            details,
        }
    }
}

/// One independently registered check function.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> CheckOutcome;
}

/// Database reachability seam. The database starter implements this for
/// `sqlx::PgPool`; registering a [`DatabaseIndicator`] in the service map
/// enables the database check.
#[async_trait]
pub trait DatabasePing: Send + Sync {
    async fn ping(&self) -> Result<(), String>;
}

/// Newtype registered in the service map to mark database reachability as
/// checkable.
pub struct DatabaseIndicator(pub Arc<dyn DatabasePing>);

/// Memory readings seam.
///
/// Rust exposes no portable allocator-heap statistic, so the default
/// reader reports the process resident set for both values; applications
/// with allocator-level stats can supply their own reader.
pub trait MemoryUsage: Send + Sync {
    fn heap_used_bytes(&self) -> u64;

    fn resident_bytes(&self) -> u64;
}

/// Default reader backed by `sysinfo`.
#[derive(Debug, Default)]
pub struct SysinfoUsage;

impl SysinfoUsage {
    fn current_rss(&self) -> u64 {
        use sysinfo::{Pid, ProcessesToUpdate, System};

        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|p| p.memory()).unwrap_or(0)
    }
}

impl MemoryUsage for SysinfoUsage {
    fn heap_used_bytes(&self) -> u64 {
        self.current_rss()
    }

    fn resident_bytes(&self) -> u64 {
        self.current_rss()
    }
}

struct DatabaseCheck {
    indicator: Arc<DatabaseIndicator>,
}

#[async_trait]
impl HealthCheck for DatabaseCheck {
    fn name(&self) -> &str {
        "database"
    }

    async fn run(&self) -> CheckOutcome {
        match self.indicator.0.ping().await {
            Ok(()) => CheckOutcome::up(None),
            Err(e) => CheckOutcome::down(Some(serde_json::json!({ "error": e }))),
        }
    }
}

struct MemoryCheck {
    name: &'static str,
    threshold_mb: u64,
    read: fn(&dyn MemoryUsage) -> u64,
    usage: Arc<dyn MemoryUsage>,
}

#[async_trait]
impl HealthCheck for MemoryCheck {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self) -> CheckOutcome {
        let used = (self.read)(self.usage.as_ref());
        let threshold = self.threshold_mb * BYTES_PER_MB;
        let details = serde_json::json!({
            "used_bytes": used,
            "threshold_bytes": threshold,
        });
        if used <= threshold {
            CheckOutcome::up(Some(details))
        } else {
            CheckOutcome::down(Some(details))
        }
    }
}

/// Assemble the checks the options enable. An option left unset (or a
/// database option with no registered indicator) contributes nothing.
pub fn assemble_checks(
    options: &HealthOptions,
    services: &ServiceMap,
    usage: Arc<dyn MemoryUsage>,
) -> Vec<Box<dyn HealthCheck>> {
    let mut checks: Vec<Box<dyn HealthCheck>> = Vec::new();

    if options.database {
        if let Some(indicator) = services.get::<DatabaseIndicator>() {
            checks.push(Box::new(DatabaseCheck { indicator }));
        }
    }

    if let Some(memory) = &options.memory {
        checks.push(Box::new(MemoryCheck {
            name: "memory_heap",
            threshold_mb: memory.heap_mb,
            read: |usage| usage.heap_used_bytes(),
            usage: usage.clone(),
        }));
        checks.push(Box::new(MemoryCheck {
            name: "memory_rss",
            threshold_mb: memory.rss_mb,
            read: |usage| usage.resident_bytes(),
            usage,
        }));
    }

    checks
}

/// Aggregate response body.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub checks: serde_json::Map<String, serde_json::Value>,
}

/// Run every check in order and aggregate. Zero checks aggregate to `Up`.
pub async fn run_checks(checks: &[Box<dyn HealthCheck>]) -> HealthReport {
    let mut status = HealthStatus::Up;
    let mut results = serde_json::Map::new();
    for check in checks {
        let outcome = check.run().await;
        if outcome.status == HealthStatus::Down {
            status = HealthStatus::Down;
        }
        results.insert(
            check.name().to_string(),
            serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null),
        );
    }
    HealthReport {
        status,
        timestamp: chrono::Utc::now(),
        checks: results,
    }
}

/// Build the health feature module: mounts one GET route at the configured
/// path.
pub fn health_module(options: HealthOptions) -> ModuleDescriptor {
    ModuleDescriptor::new("health").with_install(move |app| {
        let services = app.services().clone();
        let path = options.path.clone();
        let usage: Arc<dyn MemoryUsage> = Arc::new(SysinfoUsage);
        let handler = move || {
            let services = services.clone();
            let options = options.clone();
            let usage = usage.clone();
            async move {
                let checks = assemble_checks(&options, &services, usage);
                let report = run_checks(&checks).await;
                let code = match report.status {
                    HealthStatus::Up => StatusCode::OK,
                    HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
                };
                (code, Json(report)).into_response()
            }
        };
        app.route(&path, get(handler));
    })
}
