//! Tests for the router
//!
//! End-to-end at the router boundary: scripted registry, stub targets, and
//! recording destination writers.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use relay_protocol::PluginError;
use relay_routing::RouteDescriptor;
use relay_transform::{ReverseTransformer, Transformer};
use relay_writers::{PluginOptions, Writer, WriterPlugin};

use crate::error::RegistryError;

use super::*;

/// Destination log shared with a recording plug-in
type Log = Arc<Mutex<Vec<(String, String)>>>;

struct RecordingPlugin {
    log: Log,
}

#[async_trait]
impl WriterPlugin for RecordingPlugin {
    async fn init(&mut self, _name: &str, _options: &PluginOptions) -> Result<(), PluginError> {
        Ok(())
    }

    async fn write_text(
        &mut self,
        _provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError> {
        self.log.lock().push((topic.to_string(), record));
        Ok(())
    }

    async fn write_text_batch(
        &mut self,
        _provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError> {
        let mut log = self.log.lock();
        for record in records {
            log.push((topic.to_string(), record));
        }
        Ok(())
    }

    async fn write_binary(
        &mut self,
        _provider: &str,
        topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError> {
        self.log
            .lock()
            .push((topic.to_string(), format!("bin:{}", record.len())));
        Ok(())
    }

    async fn write_binary_batch(
        &mut self,
        _provider: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError> {
        self.log
            .lock()
            .push((topic.to_string(), format!("binbatch:{}", records.len())));
        Ok(())
    }
}

/// Stub resolver over named recording writers
struct StubTargets {
    sources: Vec<String>,
    writers: HashMap<String, Arc<Writer>>,
}

impl RouteTargets for StubTargets {
    fn has_source(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s == name)
    }

    fn writer(&self, name: &str) -> Option<Arc<Writer>> {
        self.writers.get(name).cloned()
    }

    fn has_transformer_kind(&self, kind: &str) -> bool {
        kind == "reverser"
    }

    fn transformer(&self, _kind: &str, _info: &str) -> Option<Arc<dyn Transformer>> {
        Some(Arc::new(ReverseTransformer::new()))
    }
}

/// Registry whose response can be swapped mid-test
struct ScriptRegistry {
    response: Mutex<Result<Vec<RouteDescriptor>, String>>,
}

impl ScriptRegistry {
    fn serving(routes: Vec<RouteDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Ok(routes)),
        })
    }

    fn set(&self, response: Result<Vec<RouteDescriptor>, String>) {
        *self.response.lock() = response;
    }
}

#[async_trait]
impl MetaRegistry for ScriptRegistry {
    async fn initialize(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<Vec<RouteDescriptor>, RegistryError> {
        self.response
            .lock()
            .clone()
            .map_err(RegistryError::Malformed)
    }
}

struct TestBed {
    router: Arc<Router>,
    logs: HashMap<String, Log>,
    writers: HashMap<String, Arc<Writer>>,
}

async fn test_bed(
    sources: &[&str],
    writer_names: &[&str],
    registry: Arc<dyn MetaRegistry>,
) -> TestBed {
    let mut logs = HashMap::new();
    let mut writers = HashMap::new();
    for name in writer_names {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::new(Writer::new(
            Box::new(RecordingPlugin {
                log: Arc::clone(&log),
            }),
            PluginOptions::new(),
        ));
        writer.initialize(name).await;
        writer.start();
        logs.insert(name.to_string(), log);
        writers.insert(name.to_string(), writer);
    }

    let targets = Arc::new(StubTargets {
        sources: sources.iter().map(|s| s.to_string()).collect(),
        writers: writers.clone(),
    });

    let router = Arc::new(Router::new(registry, targets, 2));
    TestBed {
        router,
        logs,
        writers,
    }
}

async fn wait_until<F: Fn() -> bool>(cond: F) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

async fn shutdown(bed: TestBed) {
    bed.router.stop().await;
    for writer in bed.writers.values() {
        writer.stop().await;
    }
}

fn route(source: &str, topic: &str, dest: &str, dest_topic: &str) -> RouteDescriptor {
    RouteDescriptor::new(source, topic, dest, dest_topic, 0, None)
}

#[tokio::test]
async fn test_initialize_builds_table_from_registry() {
    let registry = ScriptRegistry::serving(vec![route("src1", "t/x", "w1", "u/y")]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    assert!(bed.router.initialize().await);
    assert_eq!(bed.router.state(), RunState::Initialized);
    assert_eq!(bed.router.route_count(), 1);
    assert_eq!(bed.router.metrics().snapshot().refreshes, 1);

    // Idempotent re-initialize
    assert!(bed.router.initialize().await);

    for writer in bed.writers.values() {
        writer.stop().await;
    }
}

#[tokio::test]
async fn test_initialize_tolerates_fetch_failure() {
    let registry = ScriptRegistry::serving(Vec::new());
    registry.set(Err("registry down".to_string()));
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    assert!(bed.router.initialize().await);
    assert_eq!(bed.router.route_count(), 0);
    assert_eq!(bed.router.metrics().snapshot().refresh_failures, 1);

    for writer in bed.writers.values() {
        writer.stop().await;
    }
}

#[tokio::test]
async fn test_passthrough_routing_end_to_end() {
    let registry = ScriptRegistry::serving(vec![route("src1", "t/x", "w1", "u/y")]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    assert!(bed.router.start());
    assert_eq!(bed.router.state(), RunState::Running);

    assert!(bed.router.write_text("src1", "t/x", "hello".to_string()));
    wait_until(|| !bed.logs["w1"].lock().is_empty()).await;

    let log = bed.logs["w1"].lock();
    assert_eq!(log.as_slice(), &[("u/y".to_string(), "hello".to_string())]);
    drop(log);

    assert_eq!(bed.router.metrics().snapshot().routed, 1);
    shutdown(bed).await;
}

#[tokio::test]
async fn test_wildcard_routing_preserves_payload() {
    let registry = ScriptRegistry::serving(vec![route("src1", "sensors/*", "w1", "out")]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    bed.router.start();

    bed.router
        .write_text("src1", "sensors/temp/42", "21.5".to_string());
    wait_until(|| !bed.logs["w1"].lock().is_empty()).await;

    assert_eq!(
        bed.logs["w1"].lock().as_slice(),
        &[("out".to_string(), "21.5".to_string())]
    );
    shutdown(bed).await;
}

#[tokio::test]
async fn test_unrouteable_records_dropped_silently() {
    let registry = ScriptRegistry::serving(vec![route("src1", "t/x", "w1", "u/y")]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    bed.router.start();

    // No route for this topic: dropped, router keeps going
    bed.router.write_text("src1", "ghost", "lost".to_string());
    bed.router.write_text("src1", "t/x", "kept".to_string());

    wait_until(|| !bed.logs["w1"].lock().is_empty()).await;
    assert_eq!(bed.logs["w1"].lock()[0].1, "kept");

    let snapshot = bed.router.metrics().snapshot();
    assert_eq!(snapshot.unrouteable, 1);
    assert_eq!(snapshot.routed, 1);
    shutdown(bed).await;
}

#[tokio::test]
async fn test_transform_route_applies_transformer() {
    let registry = ScriptRegistry::serving(vec![RouteDescriptor::new(
        "src1",
        "t/x",
        "w1",
        "u/y",
        2,
        Some("reverser:".to_string()),
    )]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    bed.router.start();

    bed.router.write_text_batch(
        "src1",
        "t/x",
        vec![
            "abc".to_string(),
            "de".to_string(),
            "fgh".to_string(),
            "ij".to_string(),
        ],
    );
    wait_until(|| bed.logs["w1"].lock().len() == 4).await;

    let log = bed.logs["w1"].lock();
    let records: Vec<&str> = log.iter().map(|(_, r)| r.as_str()).collect();
    assert_eq!(records, vec!["cba", "ed", "hgf", "ji"]);
    drop(log);
    shutdown(bed).await;
}

#[tokio::test]
async fn test_refresh_rebinds_and_failure_retains() {
    let registry = ScriptRegistry::serving(vec![route("src1", "t", "wa", "out")]);
    let bed = test_bed(&["src1"], &["wa", "wb"], Arc::clone(&registry) as _).await;

    bed.router.initialize().await;
    bed.router.start();

    bed.router.write_text("src1", "t", "first".to_string());
    wait_until(|| !bed.logs["wa"].lock().is_empty()).await;

    // Rebind the route to wb and refresh
    registry.set(Ok(vec![route("src1", "t", "wb", "out")]));
    bed.router.refresh().await;

    bed.router.write_text("src1", "t", "second".to_string());
    wait_until(|| !bed.logs["wb"].lock().is_empty()).await;
    assert_eq!(bed.logs["wb"].lock()[0].1, "second");
    assert_eq!(bed.logs["wa"].lock().len(), 1, "wa no longer bound");

    // A failing fetch retains the wb binding
    registry.set(Err("registry down".to_string()));
    bed.router.refresh().await;

    bed.router.write_text("src1", "t", "third".to_string());
    wait_until(|| bed.logs["wb"].lock().len() == 2).await;
    assert_eq!(bed.logs["wb"].lock()[1].1, "third");
    shutdown(bed).await;
}

#[tokio::test]
async fn test_binary_records_route() {
    let registry = ScriptRegistry::serving(vec![route("src1", "t", "w1", "out")]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    bed.router.start();

    bed.router
        .write_binary("src1", "t", Bytes::from_static(b"abcd"));
    bed.router.write_binary_batch(
        "src1",
        "t",
        vec![Bytes::from_static(b"x"), Bytes::from_static(b"y")],
    );

    wait_until(|| bed.logs["w1"].lock().len() == 2).await;
    let log = bed.logs["w1"].lock();
    assert!(log.iter().any(|(_, r)| r == "bin:4"));
    assert!(log.iter().any(|(_, r)| r == "binbatch:2"));
    drop(log);
    shutdown(bed).await;
}

#[tokio::test]
async fn test_stop_refuses_until_running_then_stops() {
    let registry = ScriptRegistry::serving(Vec::new());
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    assert!(!bed.router.stop().await, "stop before start is a no-op");

    assert!(bed.router.start());
    assert!(!bed.router.start(), "double start is a no-op");
    assert!(bed.router.stop().await);
    assert_eq!(bed.router.state(), RunState::Stopped);

    // Restart after stop works
    assert!(bed.router.start());
    shutdown(bed).await;
}

#[tokio::test]
async fn test_records_staged_before_start_drain_after() {
    let registry = ScriptRegistry::serving(vec![route("src1", "t", "w1", "out")]);
    let bed = test_bed(&["src1"], &["w1"], registry).await;

    bed.router.initialize().await;
    bed.router.write_text("src1", "t", "early".to_string());
    assert_eq!(bed.router.pending(), 1);

    bed.router.start();
    wait_until(|| !bed.logs["w1"].lock().is_empty()).await;
    assert_eq!(bed.logs["w1"].lock()[0].1, "early");
    shutdown(bed).await;
}
