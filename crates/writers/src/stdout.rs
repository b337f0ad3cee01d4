//! Stdout writer - human-readable debug output
//!
//! Prints each record as `<topic> <record>` lines. Not intended for
//! production throughput; it exists to watch a flow end to end without
//! standing up an external sink.

use async_trait::async_trait;

use relay_protocol::PluginError;

use crate::adapter::TextPlugin;
use crate::plugin::PluginOptions;

/// Text plug-in that prints records to stdout
#[derive(Debug, Default)]
pub struct StdoutPlugin {
    tag: String,
}

impl StdoutPlugin {
    /// Create a stdout plug-in; the instance name becomes the line tag
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TextPlugin for StdoutPlugin {
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError> {
        // Optional "tag" option overrides the instance name in output
        self.tag = options
            .get("tag")
            .and_then(|v| v.as_str())
            .unwrap_or(name)
            .to_string();
        Ok(())
    }

    async fn write(
        &mut self,
        _provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError> {
        println!("[{}] {} {}", self.tag, topic, record);
        Ok(())
    }

    async fn write_batch(
        &mut self,
        _provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError> {
        for record in records {
            println!("[{}] {} {}", self.tag, topic, record);
        }
        Ok(())
    }
}
