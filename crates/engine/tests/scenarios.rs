//! End-to-end scenarios through a full engine
//!
//! Each test composes an engine from a JSON config, a scripted source kind,
//! and a recording writer kind, then observes what comes out the far end.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use relay_config::Config;
use relay_engine::{Engine, PluginRegistries};
use relay_protocol::{PluginError, RunState};
use relay_sources::{SourceContext, SourceFactory, SourcePlugin};
use relay_writers::{PluginOptions, WriterFactory, WriterPlugin};

// =============================================================================
// Test plug-ins
// =============================================================================

/// One observed delivery at a recording writer
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    Text {
        writer: String,
        topic: String,
        record: String,
    },
    Batch {
        writer: String,
        topic: String,
        records: Vec<String>,
    },
}

#[derive(Clone, Default)]
struct Observed {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    fail_writes: Arc<AtomicBool>,
    fatal_trips: Arc<AtomicU64>,
}

impl Observed {
    fn texts_for(&self, writer: &str) -> Vec<(String, String)> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Text {
                    writer: w,
                    topic,
                    record,
                } if w == writer => Some((topic.clone(), record.clone())),
                _ => None,
            })
            .collect()
    }

    fn batches_for(&self, writer: &str) -> Vec<Vec<String>> {
        self.deliveries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Batch {
                    writer: w, records, ..
                } if w == writer => Some(records.clone()),
                _ => None,
            })
            .collect()
    }

    fn total(&self) -> usize {
        self.deliveries.lock().len()
    }
}

struct RecordingPlugin {
    name: String,
    observed: Observed,
}

#[async_trait]
impl WriterPlugin for RecordingPlugin {
    async fn init(&mut self, name: &str, _options: &PluginOptions) -> Result<(), PluginError> {
        self.name = name.to_string();
        Ok(())
    }

    async fn write_text(
        &mut self,
        _provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError> {
        if self.observed.fail_writes.load(Ordering::SeqCst) {
            self.observed.fatal_trips.fetch_add(1, Ordering::SeqCst);
            return Err(PluginError::fatal("injected failure"));
        }
        self.observed.deliveries.lock().push(Delivery::Text {
            writer: self.name.clone(),
            topic: topic.to_string(),
            record,
        });
        Ok(())
    }

    async fn write_text_batch(
        &mut self,
        _provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError> {
        self.observed.deliveries.lock().push(Delivery::Batch {
            writer: self.name.clone(),
            topic: topic.to_string(),
            records,
        });
        Ok(())
    }

    async fn write_binary(
        &mut self,
        _provider: &str,
        topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError> {
        self.observed.deliveries.lock().push(Delivery::Text {
            writer: self.name.clone(),
            topic: topic.to_string(),
            record: format!("bin:{}", record.len()),
        });
        Ok(())
    }

    async fn write_binary_batch(
        &mut self,
        _provider: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError> {
        self.observed.deliveries.lock().push(Delivery::Text {
            writer: self.name.clone(),
            topic: topic.to_string(),
            record: format!("binbatch:{}", records.len()),
        });
        Ok(())
    }
}

struct RecordingFactory {
    observed: Observed,
}

impl WriterFactory for RecordingFactory {
    fn create(&self) -> Box<dyn WriterPlugin> {
        Box::new(RecordingPlugin {
            name: String::new(),
            observed: self.observed.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// What a scripted source should emit next
#[derive(Debug, Clone)]
enum Emit {
    Text { topic: String, record: String },
    Batch { topic: String, records: Vec<String> },
}

type Script = Arc<Mutex<VecDeque<Emit>>>;

struct ScriptPlugin {
    script: Script,
}

#[async_trait]
impl SourcePlugin for ScriptPlugin {
    async fn init(&mut self, _name: &str, _options: &PluginOptions) -> Result<(), PluginError> {
        Ok(())
    }

    async fn run(&mut self, ctx: SourceContext) -> Result<(), PluginError> {
        while ctx.is_running() {
            let next = self.script.lock().pop_front();
            match next {
                Some(Emit::Text { topic, record }) => {
                    ctx.write_text(&topic, record);
                }
                Some(Emit::Batch { topic, records }) => {
                    ctx.write_text_batch(&topic, records);
                }
                None => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
        Ok(())
    }
}

struct ScriptFactory {
    script: Script,
}

impl SourceFactory for ScriptFactory {
    fn create(&self) -> Box<dyn SourcePlugin> {
        Box::new(ScriptPlugin {
            script: Arc::clone(&self.script),
        })
    }

    fn name(&self) -> &'static str {
        "script"
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Deployment {
    engine: Engine,
    observed: Observed,
    script: Script,
}

impl Deployment {
    fn new(config_json: &str) -> Self {
        let observed = Observed::default();
        let script: Script = Arc::new(Mutex::new(VecDeque::new()));

        let mut registries = PluginRegistries::builtin();
        registries.writers.register(
            "recording",
            RecordingFactory {
                observed: observed.clone(),
            },
        );
        registries.sources.register(
            "script",
            ScriptFactory {
                script: Arc::clone(&script),
            },
        );

        let config = Config::from_str(config_json).expect("config parses");
        Self {
            engine: Engine::new(config, registries),
            observed,
            script,
        }
    }

    fn emit(&self, topic: &str, record: &str) {
        self.script.lock().push_back(Emit::Text {
            topic: topic.to_string(),
            record: record.to_string(),
        });
    }

    fn emit_batch(&self, topic: &str, records: &[&str]) {
        self.script.lock().push_back(Emit::Batch {
            topic: topic.to_string(),
            records: records.iter().map(|r| r.to_string()).collect(),
        });
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

fn base_config(routes: &str) -> String {
    format!(
        r#"{{
            "DeployName": "scenario",
            "TargetThreads": 2,
            "Types": {{
                "DataSources": {{ "gen": "script" }},
                "DataWriters": {{ "sink": "recording" }},
                "Transformers": {{ "reverser": "reverse" }}
            }},
            "Sources": {{ "src1": {{ "type": "gen" }} }},
            "Writers": {{ "w1": {{ "type": "sink" }}, "w2": {{ "type": "sink" }} }},
            "Registry": {{ "type": "static", "routes": [{routes}] }}
        }}"#
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn pass_through_routing() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "t/x", "destName": "w1",
             "destTopic": "u/y", "batchSize": 0, "xformName": "" }"#,
    ));

    assert!(deployment.engine.initialize().await);
    assert!(deployment.engine.start().await);
    assert_eq!(deployment.engine.state(), RunState::Running);

    deployment.emit("t/x", "hello");
    wait_until(|| deployment.observed.total() == 1).await;

    assert_eq!(
        deployment.observed.texts_for("w1"),
        vec![("u/y".to_string(), "hello".to_string())]
    );

    assert!(deployment.engine.stop().await);
    assert_eq!(deployment.engine.state(), RunState::Stopped);
}

#[tokio::test]
async fn batched_transformation() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "t/x", "destName": "w1",
             "destTopic": "u/y", "batchSize": 2, "xformName": "reverser:" }"#,
    ));

    deployment.engine.initialize().await;
    deployment.engine.start().await;

    deployment.emit_batch("t/x", &["abc", "de", "fgh", "ij"]);
    wait_until(|| deployment.observed.batches_for("w1").len() == 2).await;

    let batches = deployment.observed.batches_for("w1");
    assert_eq!(batches[0], vec!["cba".to_string(), "ed".to_string()]);
    assert_eq!(batches[1], vec!["hgf".to_string(), "ji".to_string()]);

    deployment.engine.stop().await;
}

#[tokio::test]
async fn wildcard_match() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "sensors/*", "destName": "w1",
             "destTopic": "out", "batchSize": 0, "xformName": "" }"#,
    ));

    deployment.engine.initialize().await;
    deployment.engine.start().await;

    deployment.emit("sensors/temp/42", "21.5");
    wait_until(|| deployment.observed.total() == 1).await;

    assert_eq!(
        deployment.observed.texts_for("w1"),
        vec![("out".to_string(), "21.5".to_string())]
    );

    deployment.engine.stop().await;
}

#[tokio::test]
async fn unrouteable_records_are_dropped() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "t/x", "destName": "w1",
             "destTopic": "u/y", "batchSize": 0, "xformName": "" }"#,
    ));

    deployment.engine.initialize().await;
    deployment.engine.start().await;

    deployment.emit("ghost", "never seen");
    deployment.emit("t/x", "seen");
    wait_until(|| {
        deployment.observed.total() == 1
            && deployment.engine.router().metrics().snapshot().unrouteable == 1
    })
    .await;

    // Only the routed record arrived, and the pipeline is still healthy
    assert_eq!(deployment.observed.texts_for("w1")[0].1, "seen");
    assert_eq!(deployment.engine.state(), RunState::Running);

    deployment.engine.stop().await;
}

#[tokio::test]
async fn failed_writer_is_restarted_by_monitor() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "t/x", "destName": "w1",
             "destTopic": "u/y", "batchSize": 0, "xformName": "" }"#,
    ));

    deployment.engine.initialize().await;
    deployment.engine.start().await;

    deployment.emit("t/x", "before");
    wait_until(|| deployment.observed.total() == 1).await;

    // Break the writer: the next record trips a fatal plug-in error
    deployment.observed.fail_writes.store(true, Ordering::SeqCst);
    deployment.emit("t/x", "tripwire");

    let w1 = deployment.engine.writer("w1").expect("writer exists");
    wait_until(|| deployment.observed.fatal_trips.load(Ordering::SeqCst) >= 1).await;

    // Heal the plug-in; the monitor brings the writer back
    deployment.observed.fail_writes.store(false, Ordering::SeqCst);
    wait_until(|| w1.state() == RunState::Running).await;

    // Steady-state load flows again after the restart; the record that
    // tripped the failure is lost (at-most-once)
    deployment.emit("t/x", "after");
    wait_until(|| {
        deployment
            .observed
            .texts_for("w1")
            .iter()
            .any(|(_, r)| r == "after")
    })
    .await;
    assert!(!deployment
        .observed
        .texts_for("w1")
        .iter()
        .any(|(_, r)| r == "tripwire"));

    deployment.engine.stop().await;
}

#[tokio::test]
async fn two_writers_routed_independently() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "t/a", "destName": "w1",
             "destTopic": "out-a", "batchSize": 0, "xformName": "" },
           { "source": "src1", "sourceTopic": "t/b", "destName": "w2",
             "destTopic": "out-b", "batchSize": 0, "xformName": "" }"#,
    ));

    deployment.engine.initialize().await;
    deployment.engine.start().await;

    deployment.emit("t/a", "to-w1");
    deployment.emit("t/b", "to-w2");
    wait_until(|| deployment.observed.total() == 2).await;

    assert_eq!(
        deployment.observed.texts_for("w1"),
        vec![("out-a".to_string(), "to-w1".to_string())]
    );
    assert_eq!(
        deployment.observed.texts_for("w2"),
        vec![("out-b".to_string(), "to-w2".to_string())]
    );

    deployment.engine.stop().await;
}

// =============================================================================
// Lifecycle edges
// =============================================================================

#[tokio::test]
async fn initialize_is_idempotent_and_start_order_enforced() {
    let deployment = Deployment::new(&base_config(""));

    assert!(!deployment.engine.start().await, "start before initialize");

    assert!(deployment.engine.initialize().await);
    assert!(deployment.engine.initialize().await, "re-initialize is true");

    assert!(deployment.engine.start().await);
    assert!(!deployment.engine.start().await, "double start is a no-op");

    assert!(deployment.engine.stop().await);
    assert!(!deployment.engine.stop().await, "double stop is a no-op");

    // Stopped engines restart
    assert!(deployment.engine.start().await);
    assert!(deployment.engine.stop().await);
}

#[tokio::test]
async fn unresolvable_instance_is_omitted() {
    // "ghost" is declared in Types but no factory is registered for it
    let config = r#"{
        "DeployName": "partial",
        "Types": {
            "DataSources": { "gen": "script" },
            "DataWriters": { "sink": "recording", "broken": "ghost" }
        },
        "Sources": { "src1": { "type": "gen" } },
        "Writers": { "w1": { "type": "sink" }, "missing": { "type": "broken" } },
        "Registry": { "type": "static", "routes": [] }
    }"#;
    let deployment = Deployment::new(config);

    assert!(deployment.engine.initialize().await);
    assert!(deployment.engine.writer("w1").is_some());
    assert!(deployment.engine.writer("missing").is_none());

    assert!(deployment.engine.start().await);
    deployment.engine.stop().await;
}

#[tokio::test]
async fn component_states_follow_engine_lifecycle() {
    let deployment = Deployment::new(&base_config(
        r#"{ "source": "src1", "sourceTopic": "t/x", "destName": "w1",
             "destTopic": "u/y", "batchSize": 0, "xformName": "" }"#,
    ));

    deployment.engine.initialize().await;
    let src = deployment.engine.source("src1").unwrap();
    let w1 = deployment.engine.writer("w1").unwrap();
    assert_eq!(src.state(), RunState::Initialized);
    assert_eq!(w1.state(), RunState::Initialized);
    assert_eq!(
        deployment.engine.router().state(),
        RunState::Initialized
    );

    deployment.engine.start().await;
    assert_eq!(src.state(), RunState::Running);
    assert_eq!(w1.state(), RunState::Running);
    assert_eq!(deployment.engine.router().state(), RunState::Running);

    deployment.engine.stop().await;
    assert_eq!(src.state(), RunState::Stopped);
    assert_eq!(w1.state(), RunState::Stopped);
    assert_eq!(deployment.engine.router().state(), RunState::Stopped);
}
