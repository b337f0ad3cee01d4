//! Route descriptors
//!
//! A descriptor is one routing rule as delivered by the route registry:
//! where records come from, where they go, how large a transformer batch may
//! be, and which transformer (if any) rewrites them on the way.

/// One routing rule from the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Source instance name
    pub source_provider: String,

    /// Source topic, exact or with a trailing `/*` wildcard
    pub source_topic: String,

    /// Destination writer instance name
    pub dest_provider: String,

    /// Destination topic all matched records are written to
    pub dest_topic: String,

    /// Maximum records per transformer batch call; 0 disables batching
    pub max_batch_size: usize,

    /// `"name:info"` transform selector; `None` or empty means pass-through
    pub transform_meta: Option<String>,
}

impl RouteDescriptor {
    /// Create a descriptor, normalizing a negative batch size to 0 and an
    /// empty transform selector to `None`
    pub fn new(
        source_provider: impl Into<String>,
        source_topic: impl Into<String>,
        dest_provider: impl Into<String>,
        dest_topic: impl Into<String>,
        max_batch_size: i64,
        transform_meta: impl Into<Option<String>>,
    ) -> Self {
        let transform_meta = transform_meta.into().filter(|s| !s.is_empty());
        Self {
            source_provider: source_provider.into(),
            source_topic: source_topic.into(),
            dest_provider: dest_provider.into(),
            dest_topic: dest_topic.into(),
            max_batch_size: max_batch_size.max(0) as usize,
            transform_meta,
        }
    }

    /// Whether this route carries a transform
    #[inline]
    pub fn has_transform(&self) -> bool {
        self.transform_meta.is_some()
    }

    /// The transform's logical name: everything before the first `:`,
    /// lowercased. `None` when there is no transform or the selector is
    /// malformed (no name segment before the separator).
    pub fn transform_name(&self) -> Option<String> {
        let meta = self.transform_meta.as_deref()?;
        let sep = meta.find(':')?;
        if sep == 0 {
            return None;
        }
        Some(meta[..sep].to_lowercase())
    }

    /// The transform's configuration: everything after the first `:`
    pub fn transform_info(&self) -> Option<&str> {
        let meta = self.transform_meta.as_deref()?;
        let sep = meta.find(':')?;
        if sep == 0 {
            return None;
        }
        Some(&meta[sep + 1..])
    }
}

impl std::fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} -> {}/{} (batch {}, transform {})",
            self.source_provider,
            self.source_topic,
            self.dest_provider,
            self.dest_topic,
            self.max_batch_size,
            self.transform_meta.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(meta: Option<&str>) -> RouteDescriptor {
        RouteDescriptor::new(
            "src",
            "t",
            "w",
            "u",
            0,
            meta.map(str::to_string),
        )
    }

    #[test]
    fn test_empty_and_none_meta_are_passthrough() {
        assert!(!descriptor(None).has_transform());
        assert!(!descriptor(Some("")).has_transform());
    }

    #[test]
    fn test_name_is_lowercased_prefix() {
        let d = descriptor(Some("Lambda:myFunction"));
        assert!(d.has_transform());
        assert_eq!(d.transform_name().as_deref(), Some("lambda"));
        assert_eq!(d.transform_info(), Some("myFunction"));
    }

    #[test]
    fn test_info_keeps_later_separators() {
        let d = descriptor(Some("lookup:host:port"));
        assert_eq!(d.transform_name().as_deref(), Some("lookup"));
        assert_eq!(d.transform_info(), Some("host:port"));
    }

    #[test]
    fn test_empty_info_is_allowed() {
        let d = descriptor(Some("reverse:"));
        assert_eq!(d.transform_name().as_deref(), Some("reverse"));
        assert_eq!(d.transform_info(), Some(""));
    }

    #[test]
    fn test_malformed_selector_has_no_name() {
        // has_transform is true, but the name cannot be parsed
        let no_sep = descriptor(Some("justaname"));
        assert!(no_sep.has_transform());
        assert_eq!(no_sep.transform_name(), None);

        let no_name = descriptor(Some(":info"));
        assert!(no_name.has_transform());
        assert_eq!(no_name.transform_name(), None);
    }

    #[test]
    fn test_negative_batch_size_normalized() {
        let d = RouteDescriptor::new("s", "t", "w", "u", -5, None);
        assert_eq!(d.max_batch_size, 0);
    }
}
