use crate::record::InvalidReason;
use std::sync::Arc;
use waf_policy_controller_k8s_api::DynamicObject;

/// An indexed `APLogConf`. Log configurations do not depend on other resources.
#[derive(Clone, Debug)]
pub struct LogConfRecord {
    pub obj: Arc<DynamicObject>,
    pub(crate) invalid: Option<InvalidReason>,
}

// === impl LogConfRecord ===

impl LogConfRecord {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    pub fn error_reason(&self) -> Option<InvalidReason> {
        self.invalid
    }
}
