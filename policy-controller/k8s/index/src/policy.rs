use crate::record::{parse_rfc3339, InvalidReason};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use waf_policy_controller_core::{RevisionWindow, SignatureRequirement, Timestamp};
use waf_policy_controller_k8s_api::{
    validation::{nested, Validate, ValidationError},
    DynamicObject, Kind, ResourceExt,
};

const SIGNATURE_REQUIREMENTS: &[&str] = &["spec", "policy", "signature-requirements"];

/// An indexed `APPolicy`.
#[derive(Clone, Debug)]
pub struct PolicyRecord {
    pub obj: Arc<DynamicObject>,

    /// Parsed when the policy is added or updated. Empty when the policy failed to parse.
    pub signature_requirements: Vec<SignatureRequirement>,

    pub(crate) invalid: Option<InvalidReason>,
}

#[derive(Debug, Error)]
pub(crate) enum PolicyError {
    #[error("Error validating policy {name}: {source}")]
    Validation {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("Error retrieving Signature requirements from {name}: {reason}")]
    Requirements { name: String, reason: &'static str },

    #[error("Error creating time requirements from {name}: Error Parsing time from {field} {source}")]
    Timestamp {
        name: String,
        field: &'static str,
        #[source]
        source: TimestampError,
    },
}

#[derive(Debug, Error)]
pub(crate) enum TimestampError {
    #[error(transparent)]
    Parse(#[from] chrono::ParseError),

    #[error("value is not a string")]
    NotAString,
}

// === impl PolicyRecord ===

impl PolicyRecord {
    pub(crate) fn new(
        obj: Arc<DynamicObject>,
        signature_requirements: Vec<SignatureRequirement>,
    ) -> Self {
        Self {
            obj,
            signature_requirements,
            invalid: None,
        }
    }

    pub(crate) fn invalid(obj: Arc<DynamicObject>, reason: InvalidReason) -> Self {
        Self {
            obj,
            signature_requirements: Vec::new(),
            invalid: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    pub fn error_reason(&self) -> Option<InvalidReason> {
        self.invalid
    }

    pub(crate) fn set_valid(&mut self) {
        self.invalid = None;
    }

    pub(crate) fn set_invalid(&mut self, reason: InvalidReason) {
        self.invalid = Some(reason);
    }
}

// === impl PolicyError ===

impl PolicyError {
    pub(crate) fn reason(&self) -> InvalidReason {
        match self {
            Self::Validation { .. } | Self::Requirements { .. } => InvalidReason::ValidationFailed,
            Self::Timestamp { .. } => InvalidReason::InvalidTimestamp,
        }
    }
}

/// Validates a policy and extracts its signature requirements.
///
/// Requirements without a `tag` are ignored. A single malformed timestamp rejects the whole
/// policy.
pub(crate) fn parse_signature_requirements<V: Validate>(
    obj: &DynamicObject,
    validator: &V,
) -> Result<Vec<SignatureRequirement>, PolicyError> {
    validator
        .validate(Kind::Policy, obj)
        .map_err(|source| PolicyError::Validation {
            name: obj.name_any(),
            source,
        })?;

    let malformed = |reason| PolicyError::Requirements {
        name: obj.name_any(),
        reason,
    };

    let list = match nested(&obj.data, SIGNATURE_REQUIREMENTS) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(list)) => list,
        Some(_) => return Err(malformed("signature-requirements must be a list")),
    };

    let mut reqs = Vec::with_capacity(list.len());
    for req in list {
        let req = req
            .as_object()
            .ok_or_else(|| malformed("signature requirement must be an object"))?;

        let tag = match req.get("tag") {
            None | Some(Value::Null) => continue,
            Some(Value::String(tag)) => tag.clone(),
            Some(_) => return Err(malformed("signature requirement tag must be a string")),
        };

        let bound = |field: &'static str| {
            parse_bound(req, field).map_err(|source| PolicyError::Timestamp {
                name: obj.name_any(),
                field,
                source,
            })
        };
        let min = bound("minRevisionDatetime")?;
        let max = bound("maxRevisionDatetime")?;

        reqs.push(SignatureRequirement::new(tag, Some(RevisionWindow::new(min, max))));
    }

    Ok(reqs)
}

fn parse_bound(req: &Map<String, Value>, field: &str) -> Result<Option<Timestamp>, TimestampError> {
    match req.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(parse_rfc3339(s)?)),
        Some(_) => Err(TimestampError::NotAString),
    }
}
