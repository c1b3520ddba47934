use crate::{
    change::{Change, Problem, SignatureSetChange},
    configuration::{Configuration, GetError},
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use waf_policy_controller_core::ResourceKey;
use waf_policy_controller_k8s_api::{ApLogConf, ApPolicy, ApUserSig, DynamicObject, Kind};

pub type SharedIndex = Arc<RwLock<Index>>;

/// Applies App Protect watch events to a [`Configuration`] and publishes the results.
///
/// Holding the index's lock for the duration of each event serializes all mutations.
#[derive(Debug)]
pub struct Index {
    configuration: Configuration,
    updates: UnboundedSender<Update>,
}

/// The outcome of a single watch event.
#[derive(Clone, Debug)]
pub enum Update {
    Resources {
        changes: Vec<Change>,
        problems: Vec<Problem>,
    },
    Signatures {
        change: SignatureSetChange,
        problems: Vec<Problem>,
    },
}

// === impl Index ===

impl Index {
    pub fn shared(updates: UnboundedSender<Update>) -> SharedIndex {
        Arc::new(RwLock::new(Self::new(Configuration::new(), updates)))
    }

    pub fn new(configuration: Configuration, updates: UnboundedSender<Update>) -> Self {
        Self {
            configuration,
            updates,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn get_resource(&self, kind: Kind, key: &str) -> Result<Arc<DynamicObject>, GetError> {
        self.configuration.get_resource(kind, key)
    }

    fn publish_resources(&self, kind: Kind, (changes, problems): (Vec<Change>, Vec<Problem>)) {
        if changes.is_empty() && problems.is_empty() {
            return;
        }
        self.send(kind, Update::Resources { changes, problems });
    }

    fn publish_signatures(&self, (change, problems): (SignatureSetChange, Vec<Problem>)) {
        self.send(Kind::UserSig, Update::Signatures { change, problems });
    }

    fn send(&self, kind: Kind, update: Update) {
        if let Err(error) = self.updates.send(update) {
            tracing::error!(%kind, %error, "Failed to send App Protect update");
        }
    }
}

impl kubert::index::IndexNamespacedResource<ApPolicy> for Index {
    fn apply(&mut self, resource: ApPolicy) {
        let res = self
            .configuration
            .add_or_update_policy(resource.into_inner());
        self.publish_resources(Kind::Policy, res);
    }

    fn delete(&mut self, namespace: String, name: String) {
        let key = ResourceKey::new(namespace, name).to_string();
        let res = self.configuration.delete_policy(&key);
        self.publish_resources(Kind::Policy, res);
    }
}

impl kubert::index::IndexNamespacedResource<ApLogConf> for Index {
    fn apply(&mut self, resource: ApLogConf) {
        let res = self
            .configuration
            .add_or_update_log_conf(resource.into_inner());
        self.publish_resources(Kind::LogConf, res);
    }

    fn delete(&mut self, namespace: String, name: String) {
        let key = ResourceKey::new(namespace, name).to_string();
        let res = self.configuration.delete_log_conf(&key);
        self.publish_resources(Kind::LogConf, res);
    }
}

impl kubert::index::IndexNamespacedResource<ApUserSig> for Index {
    fn apply(&mut self, resource: ApUserSig) {
        let res = self
            .configuration
            .add_or_update_user_sig(resource.into_inner());
        self.publish_signatures(res);
    }

    fn delete(&mut self, namespace: String, name: String) {
        let key = ResourceKey::new(namespace, name).to_string();
        // An empty signature set is meaningful to the consumer, so deletes of unknown
        // signatures must not be published.
        if self.configuration.user_sig(&key).is_none() {
            return;
        }
        let res = self.configuration.delete_user_sig(&key);
        self.publish_signatures(res);
    }
}
