//! The route table
//!
//! A two-level map `source → topic → binding`. Reconciled against a fresh
//! descriptor set by an insert-update-prune pass; read by router workers
//! through an atomically published pointer.

use std::collections::HashMap;
use std::sync::Arc;

use relay_writers::TransformerWriter;

use crate::descriptor::RouteDescriptor;
use crate::targets::RouteTargets;

/// The value half of a route: the transform selector it was built from and
/// the binding records are dispatched through. Bindings are immutable after
/// insertion, so clones of the table alias them.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    transform: String,
    writer: Arc<TransformerWriter>,
}

impl RouteBinding {
    /// The `"name:info"` selector this binding was built from, empty for
    /// pass-through
    #[inline]
    pub fn transform(&self) -> &str {
        &self.transform
    }

    /// The transformer-writer records are dispatched through
    #[inline]
    pub fn writer(&self) -> &Arc<TransformerWriter> {
        &self.writer
    }
}

/// Check an incoming topic against a registered route topic.
///
/// With `wildcard` the route topic must end in `/*`; the incoming topic
/// matches when it equals the stripped prefix or sits anywhere under it:
/// `a/b/*` matches `a/b` and `a/b/c/d`, but not `a/bc`.
pub fn topic_match(incoming: &str, route_topic: &str, wildcard: bool) -> bool {
    if !wildcard {
        return incoming == route_topic;
    }
    let Some(prefix) = route_topic.strip_suffix("/*") else {
        return false;
    };
    match incoming.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// In-memory materialization of all routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, HashMap<String, RouteBinding>>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile this table against a fresh descriptor set.
    ///
    /// For each descriptor whose source and destination writer resolve, a
    /// binding is inserted or replaced. Descriptors naming an unknown
    /// transformer kind are skipped; a transformer whose construction fails
    /// degrades to a pass-through binding. Afterwards every `(source,
    /// topic)` the descriptors no longer name is pruned, and sources left
    /// without topics are removed.
    pub fn update_routes(&mut self, descriptors: &[RouteDescriptor], targets: &dyn RouteTargets) {
        for d in descriptors {
            if !targets.has_source(&d.source_provider) {
                tracing::debug!(route = %d, "skipping route: unknown source");
                continue;
            }
            let Some(writer) = targets.writer(&d.dest_provider) else {
                tracing::debug!(route = %d, "skipping route: unknown writer");
                continue;
            };

            let (transform, transformer) = if d.has_transform() {
                let Some(kind) = d.transform_name() else {
                    tracing::warn!(route = %d, "skipping route: malformed transform selector");
                    continue;
                };
                if !targets.has_transformer_kind(&kind) {
                    tracing::warn!(route = %d, kind = %kind, "skipping route: unknown transformer kind");
                    continue;
                }
                let info = d.transform_info().unwrap_or_default();
                let transformer = targets.transformer(&kind, info);
                if transformer.is_none() {
                    tracing::warn!(
                        route = %d,
                        kind = %kind,
                        "transformer construction failed, routing as pass-through"
                    );
                }
                (d.transform_meta.clone().unwrap_or_default(), transformer)
            } else {
                (String::new(), None)
            };

            let binding = RouteBinding {
                transform,
                writer: Arc::new(TransformerWriter::new(
                    transformer,
                    writer,
                    d.dest_provider.clone(),
                    d.dest_topic.clone(),
                    d.max_batch_size,
                )),
            };
            binding.writer.initialize();

            tracing::info!(route = %d, "route installed");
            self.routes
                .entry(d.source_provider.clone())
                .or_default()
                .insert(d.source_topic.clone(), binding);
        }

        self.prune(descriptors);
    }

    /// Remove every `(source, topic)` pair the descriptors no longer name
    fn prune(&mut self, descriptors: &[RouteDescriptor]) {
        self.routes.retain(|source, topics| {
            topics.retain(|topic, _| {
                let keep = descriptors
                    .iter()
                    .any(|d| d.source_provider == *source && d.source_topic == *topic);
                if !keep {
                    tracing::info!(source = %source, topic = %topic, "route pruned");
                }
                keep
            });
            !topics.is_empty()
        });
    }

    /// Resolve `(source, topic)` to a binding: exact topic first, then the
    /// first matching `/*` wildcard. Returns `None` when the record is
    /// unrouteable.
    pub fn lookup(&self, source: &str, topic: &str) -> Option<&RouteBinding> {
        let topics = self.routes.get(source)?;
        if let Some(binding) = topics.get(topic) {
            return Some(binding);
        }
        topics
            .iter()
            .find(|(route_topic, _)| {
                route_topic.ends_with("/*") && topic_match(topic, route_topic, true)
            })
            .map(|(_, binding)| binding)
    }

    /// Number of `(source, topic)` routes in the table
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    /// Whether the table holds no routes
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate all `(source, topic, binding)` routes
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &RouteBinding)> {
        self.routes.iter().flat_map(|(source, topics)| {
            topics
                .iter()
                .map(move |(topic, binding)| (source.as_str(), topic.as_str(), binding))
        })
    }
}
