//! Relay Configuration
//!
//! JSON-based configuration loading for the ingest daemon. The file is
//! resolved from the `--config` flag, the `RELAY_CONFIG` environment
//! variable, or `./config.json`, in that order.
//!
//! # Example
//!
//! ```json
//! {
//!   "DeployName": "plant-7",
//!   "TargetThreads": 3,
//!   "Types": {
//!     "DataSources": { "ticker": "interval" },
//!     "DataWriters": { "console": "stdout" },
//!     "Transformers": { "reverser": "reverse" }
//!   },
//!   "Sources": { "src1": { "type": "ticker", "topic": "t/x" } },
//!   "Writers": { "w1": { "type": "console" } },
//!   "Registry": { "type": "static", "routes": [] }
//! }
//! ```
//!
//! Unknown keys are ignored so deployments can carry extra metadata; an
//! instance entry without a `type` key is a load error.

mod error;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};

/// Default worker count for the router when `TargetThreads` is missing or ≤ 0
pub const DEFAULT_TARGET_THREADS: usize = 3;

/// Environment variable consulted when no `--config` flag is given
pub const CONFIG_ENV: &str = "RELAY_CONFIG";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment identifier, passed to the route registry on fetch
    #[serde(rename = "DeployName")]
    pub deploy_name: String,

    /// Router worker count; values ≤ 0 fall back to the default
    #[serde(rename = "TargetThreads")]
    pub target_threads: i64,

    /// Logical type name → plug-in implementation identifier
    #[serde(rename = "Types")]
    pub types: TypesConfig,

    /// Source instances by name
    #[serde(rename = "Sources")]
    pub sources: HashMap<String, InstanceConfig>,

    /// Writer instances by name
    #[serde(rename = "Writers")]
    pub writers: HashMap<String, InstanceConfig>,

    /// Route registry configuration
    #[serde(rename = "Registry")]
    pub registry: RegistryConfig,
}

/// The three plug-in type tables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    /// Source kinds: logical name → implementation identifier
    #[serde(rename = "DataSources")]
    pub data_sources: HashMap<String, String>,

    /// Writer kinds
    #[serde(rename = "DataWriters")]
    pub data_writers: HashMap<String, String>,

    /// Transformer kinds
    #[serde(rename = "Transformers")]
    pub transformers: HashMap<String, String>,
}

/// One configured source or writer instance.
///
/// `type` is required and names a logical type from [`TypesConfig`]; all
/// remaining keys are instance-specific and handed to the plug-in verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    /// Logical type of this instance
    #[serde(rename = "type")]
    pub kind: String,

    /// Instance-specific options, interpreted by the plug-in
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Which route registry implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Routes fixed in the configuration file
    #[default]
    Static,
    /// Routes fetched from an HTTP route-config endpoint
    Http,
}

/// Route registry configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry implementation
    #[serde(rename = "type")]
    pub kind: RegistryKind,

    /// Endpoint for the `http` registry
    pub url: Option<String>,

    /// Inline routes for the `static` registry
    pub routes: Vec<StaticRouteConfig>,
}

/// One inline route for the static registry.
///
/// Field names match the registry wire format so routes can be pasted
/// between the two.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticRouteConfig {
    /// Source instance name
    pub source: String,

    /// Source topic, exact or with a trailing `/*` wildcard
    #[serde(rename = "sourceTopic")]
    pub source_topic: String,

    /// Destination writer instance name
    #[serde(rename = "destName")]
    pub dest_name: String,

    /// Destination topic
    #[serde(rename = "destTopic")]
    pub dest_topic: String,

    /// Maximum records per transformer batch call; 0 disables batching
    #[serde(rename = "batchSize", default)]
    pub batch_size: i64,

    /// `"name:info"` transform selector, empty for pass-through
    #[serde(rename = "xformName", default)]
    pub xform_name: String,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Resolve the configuration path from an optional CLI override, the
    /// `RELAY_CONFIG` environment variable, or the default
    pub fn resolve_path(cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Effective router worker count
    #[inline]
    pub fn target_threads(&self) -> usize {
        if self.target_threads > 0 {
            self.target_threads as usize
        } else {
            DEFAULT_TARGET_THREADS
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-references: every instance `type` must be declared in
    /// `Types`, and the HTTP registry needs a URL.
    fn validate(&self) -> Result<()> {
        for (name, inst) in &self.sources {
            if !self.types.data_sources.contains_key(&inst.kind) {
                return Err(ConfigError::unknown_type("source", name, &inst.kind));
            }
        }
        for (name, inst) in &self.writers {
            if !self.types.data_writers.contains_key(&inst.kind) {
                return Err(ConfigError::unknown_type("writer", name, &inst.kind));
            }
        }
        if self.registry.kind == RegistryKind::Http && self.registry.url.is_none() {
            return Err(ConfigError::MissingRegistryUrl);
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("{}").unwrap();
        assert_eq!(config.target_threads(), DEFAULT_TARGET_THREADS);
        assert!(config.sources.is_empty());
        assert!(config.writers.is_empty());
        assert_eq!(config.registry.kind, RegistryKind::Static);
    }

    #[test]
    fn test_target_threads_normalization() {
        let config = Config::from_str(r#"{"TargetThreads": 8}"#).unwrap();
        assert_eq!(config.target_threads(), 8);

        let config = Config::from_str(r#"{"TargetThreads": 0}"#).unwrap();
        assert_eq!(config.target_threads(), DEFAULT_TARGET_THREADS);

        let config = Config::from_str(r#"{"TargetThreads": -2}"#).unwrap();
        assert_eq!(config.target_threads(), DEFAULT_TARGET_THREADS);
    }

    #[test]
    fn test_full_config_parse() {
        let json = r#"{
            "DeployName": "plant-7",
            "TargetThreads": 4,
            "Types": {
                "DataSources": { "ticker": "interval" },
                "DataWriters": { "console": "stdout", "drop": "null" },
                "Transformers": { "reverser": "reverse" }
            },
            "Sources": {
                "src1": { "type": "ticker", "topic": "t/x", "period_ms": 50 }
            },
            "Writers": {
                "w1": { "type": "console" },
                "w2": { "type": "drop" }
            },
            "Registry": {
                "type": "static",
                "routes": [
                    {
                        "source": "src1",
                        "sourceTopic": "t/x",
                        "destName": "w1",
                        "destTopic": "u/y",
                        "batchSize": 2,
                        "xformName": "reverser:"
                    }
                ]
            }
        }"#;
        let config = Config::from_str(json).unwrap();

        assert_eq!(config.deploy_name, "plant-7");
        assert_eq!(config.target_threads(), 4);
        assert_eq!(config.sources["src1"].kind, "ticker");
        assert_eq!(
            config.sources["src1"].options.get("topic"),
            Some(&serde_json::json!("t/x"))
        );
        assert_eq!(config.writers.len(), 2);
        assert_eq!(config.registry.routes.len(), 1);
        assert_eq!(config.registry.routes[0].batch_size, 2);
        assert_eq!(config.registry.routes[0].xform_name, "reverser:");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = Config::from_str(r#"{"DeployName": "x", "Comment": "ignored"}"#).unwrap();
        assert_eq!(config.deploy_name, "x");
    }

    #[test]
    fn test_instance_missing_type_rejected() {
        let json = r#"{
            "Types": { "DataSources": { "ticker": "interval" } },
            "Sources": { "src1": { "topic": "t/x" } }
        }"#;
        assert!(matches!(
            Config::from_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_undeclared_type_rejected() {
        let json = r#"{
            "Sources": { "src1": { "type": "ghost" } }
        }"#;
        assert!(matches!(
            Config::from_str(json),
            Err(ConfigError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_http_registry_requires_url() {
        let json = r#"{"Registry": { "type": "http" }}"#;
        assert!(matches!(
            Config::from_str(json),
            Err(ConfigError::MissingRegistryUrl)
        ));

        let json = r#"{"Registry": { "type": "http", "url": "http://localhost:9000/routes" }}"#;
        assert!(Config::from_str(json).is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"DeployName": "file-test"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.deploy_name, "file-test");

        assert!(Config::from_file(dir.path().join("missing.json")).is_err());
    }
}
