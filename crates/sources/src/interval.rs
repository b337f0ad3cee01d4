//! Interval source - synthetic records on a timer
//!
//! Emits a configurable text record on a fixed cadence. Used by the demo
//! configuration and the end-to-end tests to drive a flow without an
//! external broker.
//!
//! Options:
//! - `topic` (string): topic to emit on, default `"interval"`
//! - `period_ms` (integer): cadence in milliseconds, default 1000
//! - `message` (string): record body prefix, default `"tick"`
//! - `count` (integer): stop after this many records, default unlimited

use std::time::Duration;

use async_trait::async_trait;

use relay_protocol::PluginError;

use crate::source::{SourceContext, SourcePlugin};
use crate::PluginOptions;

/// Source plug-in that emits `"<message> <n>"` records on a timer
#[derive(Debug)]
pub struct IntervalPlugin {
    topic: String,
    period: Duration,
    message: String,
    count: Option<u64>,
}

impl IntervalPlugin {
    /// Create an interval plug-in with defaults; options are applied in
    /// `init`
    pub fn new() -> Self {
        Self {
            topic: "interval".to_string(),
            period: Duration::from_millis(1000),
            message: "tick".to_string(),
            count: None,
        }
    }
}

impl Default for IntervalPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourcePlugin for IntervalPlugin {
    async fn init(&mut self, _name: &str, options: &PluginOptions) -> Result<(), PluginError> {
        if let Some(topic) = options.get("topic").and_then(|v| v.as_str()) {
            self.topic = topic.to_string();
        }
        if let Some(period) = options.get("period_ms").and_then(|v| v.as_u64()) {
            if period == 0 {
                return Err(PluginError::init("period_ms must be positive"));
            }
            self.period = Duration::from_millis(period);
        }
        if let Some(message) = options.get("message").and_then(|v| v.as_str()) {
            self.message = message.to_string();
        }
        if let Some(count) = options.get("count").and_then(|v| v.as_u64()) {
            self.count = Some(count);
        }
        Ok(())
    }

    async fn run(&mut self, ctx: SourceContext) -> Result<(), PluginError> {
        let mut emitted: u64 = 0;
        while ctx.is_running() {
            tokio::time::sleep(self.period).await;
            if !ctx.is_running() {
                break;
            }
            ctx.write_text(&self.topic, format!("{} {}", self.message, emitted));
            emitted += 1;
            if let Some(limit) = self.count {
                if emitted >= limit {
                    tracing::debug!(source = ctx.name(), emitted, "interval source done");
                    break;
                }
            }
        }
        Ok(())
    }
}
