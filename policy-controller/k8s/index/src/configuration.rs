use crate::{
    change::{Change, Op, Problem, Resource, SignatureSetChange},
    log_conf::LogConfRecord,
    policy::{self, PolicyRecord},
    reconcile,
    record::{resource_key, InvalidReason},
    user_sig::UserSigRecord,
};
use ahash::AHashMap as HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use waf_policy_controller_core::requirements_satisfied;
use waf_policy_controller_k8s_api::{DynamicObject, Kind, RequiredFields, Validate};

/// Mirrors App Protect policies, log configurations, and user-defined signatures, and keeps
/// track of which of them may be referenced by generated configuration.
///
/// A policy's validity depends on the set of valid user signatures, so every signature
/// mutation re-runs reconciliation over the whole index. All operations are synchronous and
/// expect a single writer.
#[derive(Debug)]
pub struct Configuration<V = RequiredFields> {
    validator: V,
    policies: HashMap<String, PolicyRecord>,
    log_confs: HashMap<String, LogConfRecord>,
    user_sigs: HashMap<String, UserSigRecord>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GetError {
    #[error("App Protect {} {key} not found", .kind.short_name())]
    NotFound { kind: Kind, key: String },

    #[error(transparent)]
    Invalid(InvalidReason),
}

// === impl Configuration ===

impl Configuration {
    pub fn new() -> Self {
        Self::with_validator(RequiredFields)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Validate> Configuration<V> {
    pub fn with_validator(validator: V) -> Self {
        Self {
            validator,
            policies: HashMap::new(),
            log_confs: HashMap::new(),
            user_sigs: HashMap::new(),
        }
    }

    pub fn add_or_update_policy(&mut self, obj: DynamicObject) -> (Vec<Change>, Vec<Problem>) {
        let key = resource_key(&obj);
        let obj = Arc::new(obj);

        let policy = match policy::parse_signature_requirements(&obj, &self.validator) {
            Ok(reqs) => {
                let mut policy = PolicyRecord::new(obj.clone(), reqs);
                let sigs = reconcile::valid_signatures(&self.user_sigs);
                if !requirements_satisfied(&policy.signature_requirements, &sigs) {
                    policy.set_invalid(InvalidReason::UnsatisfiedRequirements);
                }
                policy
            }
            Err(error) => {
                debug!(%key, %error, "Rejecting policy");
                let policy = PolicyRecord::invalid(obj.clone(), error.reason());
                self.policies.insert(key, policy.clone());
                return (
                    vec![Change::delete(Resource::Policy(policy))],
                    vec![Problem::rejected(obj, error)],
                );
            }
        };

        self.policies.insert(key.clone(), policy.clone());
        match policy.invalid {
            None => {
                debug!(%key, "Added policy");
                (vec![Change::add_or_update(Resource::Policy(policy))], vec![])
            }
            Some(reason) => {
                debug!(%key, %reason, "Rejecting policy");
                (
                    vec![Change::delete(Resource::Policy(policy))],
                    vec![Problem::rejected(obj, reason)],
                )
            }
        }
    }

    pub fn add_or_update_log_conf(&mut self, obj: DynamicObject) -> (Vec<Change>, Vec<Problem>) {
        let key = resource_key(&obj);
        let obj = Arc::new(obj);

        let res = self.validator.validate(Kind::LogConf, &obj);
        let log_conf = LogConfRecord {
            obj: obj.clone(),
            invalid: res.as_ref().err().map(|_| InvalidReason::ValidationFailed),
        };
        self.log_confs.insert(key.clone(), log_conf.clone());

        match res {
            Ok(()) => {
                debug!(%key, "Added log configuration");
                (vec![Change::add_or_update(Resource::LogConf(log_conf))], vec![])
            }
            Err(error) => {
                debug!(%key, %error, "Rejecting log configuration");
                (
                    vec![Change::delete(Resource::LogConf(log_conf))],
                    vec![Problem::rejected(obj, error)],
                )
            }
        }
    }

    /// Indexes a user signature and reconciles the index against the new signature set.
    ///
    /// A signature that fails to parse is still indexed so that it occupies its key.
    pub fn add_or_update_user_sig(
        &mut self,
        obj: DynamicObject,
    ) -> (SignatureSetChange, Vec<Problem>) {
        let key = resource_key(&obj);
        let sig = UserSigRecord::parse(Arc::new(obj), &self.validator);

        let mut problems = Vec::new();
        if let Some(reason) = sig.invalid {
            debug!(%key, %reason, "Rejecting user signature");
            problems.push(Problem::rejected(sig.obj.clone(), reason));
        } else {
            debug!(%key, tag = %sig.tag, "Added user signature");
        }
        self.user_sigs.insert(key, sig);

        let change = self.signature_set_change(&mut problems);
        (change, problems)
    }

    pub fn delete_policy(&mut self, key: &str) -> (Vec<Change>, Vec<Problem>) {
        match self.policies.remove(key) {
            Some(policy) => {
                debug!(%key, "Deleted policy");
                (vec![Change::delete(Resource::Policy(policy))], vec![])
            }
            None => (vec![], vec![]),
        }
    }

    pub fn delete_log_conf(&mut self, key: &str) -> (Vec<Change>, Vec<Problem>) {
        match self.log_confs.remove(key) {
            Some(log_conf) => {
                debug!(%key, "Deleted log configuration");
                (vec![Change::delete(Resource::LogConf(log_conf))], vec![])
            }
            None => (vec![], vec![]),
        }
    }

    pub fn delete_user_sig(&mut self, key: &str) -> (SignatureSetChange, Vec<Problem>) {
        let mut problems = Vec::new();
        if self.user_sigs.remove(key).is_none() {
            return (SignatureSetChange::default(), problems);
        }

        debug!(%key, "Deleted user signature");
        let change = self.signature_set_change(&mut problems);
        (change, problems)
    }

    /// Returns a resource if it is indexed and valid.
    pub fn get_resource(&self, kind: Kind, key: &str) -> Result<Arc<DynamicObject>, GetError> {
        let found = match kind {
            Kind::Policy => self.policies.get(key).map(|r| (&r.obj, r.invalid)),
            Kind::LogConf => self.log_confs.get(key).map(|r| (&r.obj, r.invalid)),
            Kind::UserSig => self.user_sigs.get(key).map(|r| (&r.obj, r.invalid)),
        };

        match found {
            Some((obj, None)) => Ok(obj.clone()),
            Some((_, Some(reason))) => Err(GetError::Invalid(reason)),
            None => Err(GetError::NotFound {
                kind,
                key: key.to_string(),
            }),
        }
    }

    pub fn policy(&self, key: &str) -> Option<&PolicyRecord> {
        self.policies.get(key)
    }

    pub fn log_conf(&self, key: &str) -> Option<&LogConfRecord> {
        self.log_confs.get(key)
    }

    pub fn user_sig(&self, key: &str) -> Option<&UserSigRecord> {
        self.user_sigs.get(key)
    }

    pub fn policies(&self) -> impl Iterator<Item = (&str, &PolicyRecord)> + '_ {
        self.policies.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn user_sigs(&self) -> impl Iterator<Item = (&str, &UserSigRecord)> + '_ {
        self.user_sigs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Runs tag reconciliation and then policy reconciliation over the whole index.
    ///
    /// Returns changes only for records whose validity flipped.
    pub fn reconcile(&mut self) -> (Vec<Change>, Vec<Problem>) {
        let (mut changes, mut problems) = reconcile::reconcile_tags(&mut self.user_sigs);
        let (policy_changes, policy_problems) =
            reconcile::reconcile_policies(&mut self.policies, &self.user_sigs);
        changes.extend(policy_changes);
        problems.extend(policy_problems);
        (changes, problems)
    }

    fn signature_set_change(&mut self, problems: &mut Vec<Problem>) -> SignatureSetChange {
        let (changes, reconciled) = self.reconcile();
        problems.extend(reconciled);

        // Signature changes were already applied to the index; only policy side effects are
        // reported.
        let mut change = SignatureSetChange::default();
        for Change { op, resource } in changes {
            if let Resource::Policy(policy) = resource {
                match op {
                    Op::AddOrUpdate => change.policy_additions_or_updates.push(policy.obj),
                    Op::Delete => change.policy_deletions.push(policy.obj),
                }
            }
        }

        change.user_sigs = self
            .user_sigs
            .values()
            .filter(|sig| sig.is_valid())
            .map(|sig| sig.obj.clone())
            .collect();
        change
    }
}
