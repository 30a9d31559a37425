//! Filesystem component scan.
//!
//! Walks a source tree, asks a pluggable [`ComponentSource`] for the
//! components each file exports, and classifies them into handlers and
//! injectables. A file the source cannot load is skipped, never fatal:
//! discovery is best-effort by design.
//!
//! Traversal is bounded: at most [`MAX_SCAN_DEPTH`] directory levels and
//! symlinks are not followed, so a symlink cycle cannot recurse.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::registry::{ComponentRecord, COMPONENT_REGISTRY};

/// Directory levels the scan will descend.
pub const MAX_SCAN_DEPTH: usize = 32;

/// Directories never scanned: dependency output and framework-managed
/// feature/plugin directories.
const EXCLUDED_DIRS: &[&str] = &["target", "node_modules", "middleware", "plugins"];

/// Loads the components a source file exports.
///
/// The indirection exists so the scanner is unit-testable without a real
/// registry; the default [`RegistrySource`] consults the global component
/// registry by source-file path.
pub trait ComponentSource {
    fn load(&self, path: &Path) -> Result<Vec<ComponentRecord>, String>;
}

/// Default source: look the file up in the global component registry.
#[derive(Debug, Default)]
pub struct RegistrySource;

impl ComponentSource for RegistrySource {
    fn load(&self, path: &Path) -> Result<Vec<ComponentRecord>, String> {
        Ok(COMPONENT_REGISTRY.records_for_file(path))
    }
}

/// Scanner output: handlers and injectables, in discovery order.
#[derive(Debug, Default)]
pub struct DiscoveredComponents {
    pub handlers: Vec<ComponentRecord>,
    pub injectables: Vec<ComponentRecord>,
}

impl DiscoveredComponents {
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.injectables.is_empty()
    }
}

/// Scan `base_path` with the default registry-backed source.
pub fn scan(base_path: impl AsRef<Path>) -> DiscoveredComponents {
    scan_with(&RegistrySource, base_path)
}

/// Scan `base_path`, classifying every component the source yields.
///
/// Callers must not rely on any ordering between files: directory
/// traversal order is platform-dependent. Order within one file is the
/// source's insertion order.
pub fn scan_with(source: &dyn ComponentSource, base_path: impl AsRef<Path>) -> DiscoveredComponents {
    let base_path = base_path.as_ref();
    let mut discovered = DiscoveredComponents::default();

    if base_path.as_os_str().is_empty() || !base_path.exists() {
        return discovered;
    }

    let mut seen: HashSet<&'static str> = HashSet::new();

    for entry in WalkDir::new(base_path)
        .max_depth(MAX_SCAN_DEPTH)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry during scan: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_scannable_file(entry.path()) {
            continue;
        }

        let records = match source.load(entry.path()) {
            Ok(records) => records,
            Err(e) => {
                // A broken file never aborts the scan.
                debug!(file = %entry.path().display(), "skipping unloadable file: {}", e);
                continue;
            }
        };

        for record in records {
            classify(record, &mut discovered, &mut seen);
        }
    }

    debug!(
        handlers = discovered.handlers.len(),
        injectables = discovered.injectables.len(),
        "component scan finished"
    );
    discovered
}

/// Classification is independent of declaration order: both predicates are
/// evaluated for every record, and a component is never double-classified.
fn classify(
    record: ComponentRecord,
    discovered: &mut DiscoveredComponents,
    seen: &mut HashSet<&'static str>,
) {
    let has_route = record.route_path.is_some();
    let is_injectable = record.injectable;

    if !seen.insert(record.type_name) {
        return;
    }
    if has_route {
        discovered.handlers.push(record);
    } else if is_injectable {
        discovered.injectables.push(record);
    }
}

/// Excluded names apply to descendants only: a base path that itself is
/// named `plugins` was asked for explicitly and is scanned.
fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Source files only, excluding module-definition files and test files.
fn is_scannable_file(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some("rs") {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if matches!(name, "mod.rs" | "lib.rs" | "main.rs" | "tests.rs") {
        return false;
    }
    let stem = name.trim_end_matches(".rs");
    !(stem.ends_with("_test") || stem.ends_with("_tests"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(
        name: &'static str,
        file: &'static str,
        route: Option<&'static str>,
        injectable: bool,
    ) -> ComponentRecord {
        ComponentRecord {
            type_name: name,
            source_file: file,
            route_path: route,
            injectable,
            build_handler: None,
            register_service: None,
        }
    }

    /// Source keyed on file name: `controller.rs` exports a handler,
    /// `provider.rs` exports an injectable, `broken.rs` fails to load.
    struct FakeSource;

    impl ComponentSource for FakeSource {
        fn load(&self, path: &Path) -> Result<Vec<ComponentRecord>, String> {
            match path.file_name().and_then(|n| n.to_str()) {
                Some("controller.rs") => Ok(vec![record(
                    "UsersController",
                    "controller.rs",
                    Some("/users"),
                    false,
                )]),
                Some("provider.rs") => {
                    Ok(vec![record("UsersService", "provider.rs", None, true)])
                }
                Some("broken.rs") => Err("syntax error".to_string()),
                _ => Ok(Vec::new()),
            }
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "// fixture").unwrap();
    }

    #[test]
    fn scan_classifies_and_survives_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "controller.rs");
        touch(dir.path(), "provider.rs");
        touch(dir.path(), "broken.rs");

        let discovered = scan_with(&FakeSource, dir.path());
        assert_eq!(discovered.handlers.len(), 1);
        assert_eq!(discovered.handlers[0].type_name, "UsersController");
        assert_eq!(discovered.injectables.len(), 1);
        assert_eq!(discovered.injectables[0].type_name, "UsersService");
    }

    #[test]
    fn missing_base_path_yields_empty_sets_without_loads() {
        struct PanickingSource;
        impl ComponentSource for PanickingSource {
            fn load(&self, _: &Path) -> Result<Vec<ComponentRecord>, String> {
                panic!("load must not be attempted");
            }
        }
        let discovered = scan_with(&PanickingSource, "/does/not/exist");
        assert!(discovered.is_empty());

        let discovered = scan_with(&PanickingSource, "");
        assert!(discovered.is_empty());
    }

    #[test]
    fn module_test_and_reserved_files_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "mod.rs");
        touch(dir.path(), "lib.rs");
        touch(dir.path(), "users_test.rs");
        touch(dir.path(), "tests.rs");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("middleware")).unwrap();
        touch(&dir.path().join("middleware"), "controller.rs");
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        touch(&dir.path().join("node_modules"), "provider.rs");

        let discovered = scan_with(&FakeSource, dir.path());
        assert!(discovered.is_empty());
    }

    #[test]
    fn handler_marker_wins_and_nothing_is_double_classified() {
        struct BothMarkers;
        impl ComponentSource for BothMarkers {
            fn load(&self, _: &Path) -> Result<Vec<ComponentRecord>, String> {
                Ok(vec![
                    // Tagged with both markers: classified as handler only.
                    record("Hybrid", "x.rs", Some("/hybrid"), true),
                    // Tagged with neither: ignored.
                    record("Plain", "x.rs", None, false),
                ])
            }
        }
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "component.rs");

        let discovered = scan_with(&BothMarkers, dir.path());
        assert_eq!(discovered.handlers.len(), 1);
        assert!(discovered.injectables.is_empty());
    }

    #[test]
    fn duplicate_type_names_are_not_reclassified() {
        struct Dup;
        impl ComponentSource for Dup {
            fn load(&self, _: &Path) -> Result<Vec<ComponentRecord>, String> {
                Ok(vec![
                    record("Service", "a.rs", None, true),
                    record("Service", "a.rs", Some("/late"), false),
                ])
            }
        }
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "component.rs");

        let discovered = scan_with(&Dup, dir.path());
        assert_eq!(discovered.injectables.len(), 1);
        assert!(discovered.handlers.is_empty());
    }

    #[test]
    fn default_source_reads_the_global_registry() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "widget_provider.rs");
        super::super::register_component(record(
            "WidgetService",
            "widget_provider.rs",
            None,
            true,
        ));

        let discovered = scan(dir.path());
        assert!(discovered
            .injectables
            .iter()
            .any(|r| r.type_name == "WidgetService"));
    }

    #[test]
    fn plugin_directories_are_never_scanned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("plugins")).unwrap();
        touch(&dir.path().join("plugins"), "controller.rs");

        let discovered = scan_with(&FakeSource, dir.path());
        assert!(discovered.handlers.is_empty());
    }

    #[test]
    fn a_base_path_with_an_excluded_name_is_still_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("plugins");
        fs::create_dir(&base).unwrap();
        touch(&base, "controller.rs");
        // The exclusion still applies one level down.
        fs::create_dir(base.join("middleware")).unwrap();
        touch(&base.join("middleware"), "provider.rs");

        let discovered = scan_with(&FakeSource, &base);
        assert_eq!(discovered.handlers.len(), 1);
        assert!(discovered.injectables.is_empty());
    }
}
