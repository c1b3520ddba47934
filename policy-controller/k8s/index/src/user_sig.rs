use crate::record::{parse_rfc3339, InvalidReason};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use waf_policy_controller_core::{Signature, Timestamp};
use waf_policy_controller_k8s_api::{
    validation::{nested, Validate},
    DynamicObject, Kind, ResourceExt, Time,
};

/// An indexed `APUserSig`.
#[derive(Clone, Debug)]
pub struct UserSigRecord {
    pub obj: Arc<DynamicObject>,

    /// Empty when the signature has no tag. Untagged signatures are never deduplicated.
    pub tag: String,

    pub revision_time: Option<Timestamp>,

    pub(crate) invalid: Option<InvalidReason>,
}

// === impl UserSigRecord ===

impl UserSigRecord {
    pub(crate) fn parse<V: Validate>(obj: Arc<DynamicObject>, validator: &V) -> Self {
        let mut sig = Self {
            obj,
            tag: String::new(),
            revision_time: None,
            invalid: None,
        };

        if let Err(error) = validator.validate(Kind::UserSig, &sig.obj) {
            debug!(name = %sig.obj.name_any(), %error, "Invalid user signature");
            sig.invalid = Some(InvalidReason::ValidationFailed);
            return sig;
        }

        if let Some(Value::String(tag)) = nested(&sig.obj.data, &["spec", "tag"]) {
            sig.tag = tag.clone();
        }

        if let Some(Value::String(rev)) = nested(&sig.obj.data, &["spec", "revisionDatetime"]) {
            match parse_rfc3339(rev) {
                Ok(rev) => sig.revision_time = Some(rev),
                Err(error) => {
                    debug!(name = %sig.obj.name_any(), %error, "Invalid revisionDatetime");
                    sig.invalid = Some(InvalidReason::InvalidTimestamp);
                }
            }
        }

        sig
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    pub fn error_reason(&self) -> Option<InvalidReason> {
        self.invalid
    }

    /// Resources without a creation timestamp order before all others.
    pub fn creation_timestamp(&self) -> Option<Timestamp> {
        self.obj.creation_timestamp().map(|Time(t)| t)
    }

    pub fn uid(&self) -> &str {
        self.obj.metadata.uid.as_deref().unwrap_or_default()
    }

    pub(crate) fn signature(&self) -> Signature<'_> {
        Signature {
            tag: &self.tag,
            revision_time: self.revision_time,
        }
    }

    pub(crate) fn set_valid(&mut self) {
        self.invalid = None;
    }

    pub(crate) fn set_invalid(&mut self, reason: InvalidReason) {
        self.invalid = Some(reason);
    }
}
