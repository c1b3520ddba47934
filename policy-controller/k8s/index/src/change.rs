use crate::{log_conf::LogConfRecord, policy::PolicyRecord, user_sig::UserSigRecord};
use std::sync::Arc;
use waf_policy_controller_k8s_api::{DynamicObject, Kind};

/// The reason attached to every problem; matches the reason of the Kubernetes event that
/// reports it.
pub const REJECTED: &str = "Rejected";

/// Tells the configuration writer what to do with a resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    AddOrUpdate,
    Delete,
}

/// A snapshot of the record a change applies to.
#[derive(Clone, Debug)]
pub enum Resource {
    Policy(PolicyRecord),
    LogConf(LogConfRecord),
    UserSig(UserSigRecord),
}

#[derive(Clone, Debug)]
pub struct Change {
    pub op: Op,
    pub resource: Resource,
}

/// A rejection to be reported on the offending object.
#[derive(Clone, Debug)]
pub struct Problem {
    pub object: Arc<DynamicObject>,
    pub reason: &'static str,
    pub message: String,
}

/// Describes the outcome of a user signature mutation.
///
/// `user_sigs` holds every currently valid signature, not only the ones that changed, so the
/// consumer rewrites its signature set from it.
#[derive(Clone, Debug, Default)]
pub struct SignatureSetChange {
    pub policy_additions_or_updates: Vec<Arc<DynamicObject>>,
    pub policy_deletions: Vec<Arc<DynamicObject>>,
    pub user_sigs: Vec<Arc<DynamicObject>>,
}

// === impl Resource ===

impl Resource {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Policy(_) => Kind::Policy,
            Self::LogConf(_) => Kind::LogConf,
            Self::UserSig(_) => Kind::UserSig,
        }
    }

    pub fn obj(&self) -> &Arc<DynamicObject> {
        match self {
            Self::Policy(r) => &r.obj,
            Self::LogConf(r) => &r.obj,
            Self::UserSig(r) => &r.obj,
        }
    }
}

// === impl Change ===

impl Change {
    pub fn add_or_update(resource: Resource) -> Self {
        Self {
            op: Op::AddOrUpdate,
            resource,
        }
    }

    pub fn delete(resource: Resource) -> Self {
        Self {
            op: Op::Delete,
            resource,
        }
    }
}

// === impl Problem ===

impl Problem {
    pub fn rejected(object: Arc<DynamicObject>, message: impl ToString) -> Self {
        Self {
            object,
            reason: REJECTED,
            message: message.to_string(),
        }
    }
}
