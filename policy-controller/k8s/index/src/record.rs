use chrono::{DateTime, Utc};
use thiserror::Error;
use waf_policy_controller_core::{ResourceKey, Timestamp};
use waf_policy_controller_k8s_api::{DynamicObject, ResourceExt};

/// Explains why an indexed resource may not be referenced by generated configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum InvalidReason {
    #[error("Validation Failed")]
    ValidationFailed,

    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Policy has unsatisfied signature requirements")]
    UnsatisfiedRequirements,

    #[error("Duplicate tag set")]
    DuplicateTag,
}

// === impl InvalidReason ===

impl InvalidReason {
    /// Terminal reasons describe the resource itself and only change when the resource is
    /// resubmitted. The others depend on other resources and are re-derived by reconciliation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ValidationFailed | Self::InvalidTimestamp)
    }
}

/// Returns the index key of a resource, `<namespace>/<name>`.
pub fn resource_key(obj: &DynamicObject) -> String {
    ResourceKey::new(obj.namespace().unwrap_or_default(), obj.name_any()).to_string()
}

pub(crate) fn parse_rfc3339(s: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}
