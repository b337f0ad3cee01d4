//! Route registries
//!
//! A [`MetaRegistry`] produces the authoritative set of route descriptors.
//! The wire format is a nested JSON document:
//!
//! ```json
//! {
//!   "src1": {
//!     "t/x": { "destName": "w1", "destTopic": "u/y", "batchSize": 4, "xformName": "reverse:" }
//!   }
//! }
//! ```
//!
//! A document containing `errorMessage` is an error response; the router
//! reacts to any fetch error by retaining its previous table.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use relay_routing::RouteDescriptor;

use crate::error::RegistryError;

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

/// The authoritative external source of route descriptors
#[async_trait]
pub trait MetaRegistry: Send + Sync {
    /// Prepare the registry; called once during router initialization
    async fn initialize(&self) -> bool;

    /// Fetch a snapshot of the current route configuration
    async fn fetch(&self) -> Result<Vec<RouteDescriptor>, RegistryError>;
}

/// Parse the registry wire format into descriptors.
///
/// Topic entries with missing or mistyped fields are skipped with a warning
/// rather than failing the whole document.
pub fn parse_route_document(root: &Value) -> Result<Vec<RouteDescriptor>, RegistryError> {
    let Some(sources) = root.as_object() else {
        return Err(RegistryError::malformed("top level is not an object"));
    };

    if let Some(error) = sources.get("errorMessage") {
        return Err(RegistryError::Remote(
            error.as_str().unwrap_or("unknown error").to_string(),
        ));
    }

    let mut descriptors = Vec::new();
    for (source, topics) in sources {
        let Some(topics) = topics.as_object() else {
            tracing::warn!(source = %source, "skipping source: topic map is not an object");
            continue;
        };
        for (topic, entry) in topics {
            let dest_name = entry.get("destName").and_then(Value::as_str);
            let dest_topic = entry.get("destTopic").and_then(Value::as_str);
            let (Some(dest_name), Some(dest_topic)) = (dest_name, dest_topic) else {
                tracing::warn!(
                    source = %source,
                    topic = %topic,
                    "skipping route: missing destName/destTopic"
                );
                continue;
            };
            let batch_size = entry.get("batchSize").and_then(Value::as_i64).unwrap_or(0);
            let xform = entry
                .get("xformName")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();

            descriptors.push(RouteDescriptor::new(
                source.clone(),
                topic.clone(),
                dest_name,
                dest_topic,
                batch_size,
                Some(xform),
            ));
        }
    }
    Ok(descriptors)
}

/// Registry backed by an HTTP route-config endpoint.
///
/// Fetch POSTs `{"deployment_name": <name>}` and expects the wire format
/// above in response.
pub struct HttpRegistry {
    client: reqwest::Client,
    url: String,
    deployment_name: String,
}

impl HttpRegistry {
    /// Create an HTTP registry for the given endpoint and deployment
    pub fn new(url: impl Into<String>, deployment_name: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            deployment_name: deployment_name.into(),
        }
    }
}

#[async_trait]
impl MetaRegistry for HttpRegistry {
    async fn initialize(&self) -> bool {
        !self.url.is_empty()
    }

    async fn fetch(&self) -> Result<Vec<RouteDescriptor>, RegistryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "deployment_name": self.deployment_name }))
            .send()
            .await?;
        let document: Value = response.json().await?;
        parse_route_document(&document)
    }
}

/// Registry with a fixed descriptor set, served from configuration or tests
pub struct StaticRegistry {
    routes: Vec<RouteDescriptor>,
}

impl StaticRegistry {
    /// Create a static registry over a fixed route set
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl MetaRegistry for StaticRegistry {
    async fn initialize(&self) -> bool {
        true
    }

    async fn fetch(&self) -> Result<Vec<RouteDescriptor>, RegistryError> {
        Ok(self.routes.clone())
    }
}
