use std::fmt;

/// Identifies a namespaced resource. Renders as `<namespace>/<name>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

// === impl ResourceKey ===

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}

/// Qualifies a resource reference taken from an annotation. References that already name a
/// namespace are returned unchanged.
pub fn parse_resource_reference(namespace: &str, reference: &str) -> String {
    if reference.contains('/') {
        return reference.to_string();
    }
    format!("{namespace}/{reference}")
}

/// Qualifies each entry of a comma-separated list of resource references.
pub fn parse_resource_reference_list(namespace: &str, references: &str) -> Vec<String> {
    references
        .split(',')
        .map(|reference| parse_resource_reference(namespace, reference))
        .collect()
}
