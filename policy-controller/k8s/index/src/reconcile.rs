//! Re-derives validity of user signatures and policies after the signature set changes.
//!
//! Both passes sweep the whole index. They only emit changes for records whose validity
//! flipped, so running them again without an intervening mutation emits nothing.

use crate::{
    change::{Change, Problem, Resource},
    policy::PolicyRecord,
    record::InvalidReason,
    user_sig::UserSigRecord,
};
use ahash::AHashMap as HashMap;
use std::cmp::Ordering;
use tracing::info;
use waf_policy_controller_core::{requirements_satisfied, Signature};

/// Ensures each non-empty tag is held by at most one valid signature.
///
/// The oldest signature owns a tag; signatures created at the same instant are ordered by
/// descending UID. Signatures with a terminal invalid reason do not take part.
pub(crate) fn reconcile_tags(
    sigs: &mut HashMap<String, UserSigRecord>,
) -> (Vec<Change>, Vec<Problem>) {
    let mut changes = Vec::new();
    let mut problems = Vec::new();

    let mut by_tag = HashMap::<String, Vec<(&String, &mut UserSigRecord)>>::new();
    for (key, sig) in sigs.iter_mut() {
        if sig.tag.is_empty() || sig.invalid.is_some_and(InvalidReason::is_terminal) {
            continue;
        }
        by_tag.entry(sig.tag.clone()).or_default().push((key, sig));
    }

    for (tag, mut group) in by_tag {
        group.sort_by(|(_, a), (_, b)| tag_precedence(a, b));
        let mut group = group.into_iter();

        if let Some((key, owner)) = group.next() {
            if !owner.is_valid() {
                info!(%key, %tag, "User signature now owns its tag");
                owner.set_valid();
                changes.push(Change::add_or_update(Resource::UserSig(owner.clone())));
            }
        }

        for (key, sig) in group {
            if sig.is_valid() {
                info!(%key, %tag, "Rejecting user signature with duplicate tag");
                sig.set_invalid(InvalidReason::DuplicateTag);
                changes.push(Change::delete(Resource::UserSig(sig.clone())));
                problems.push(Problem::rejected(
                    sig.obj.clone(),
                    InvalidReason::DuplicateTag,
                ));
            }
        }
    }

    (changes, problems)
}

/// Orders signatures sharing a tag so that the owner comes first.
fn tag_precedence(a: &UserSigRecord, b: &UserSigRecord) -> Ordering {
    a.creation_timestamp()
        .cmp(&b.creation_timestamp())
        .then_with(|| b.uid().cmp(a.uid()))
}

/// Re-evaluates every policy whose validity depends on the signature set.
pub(crate) fn reconcile_policies(
    policies: &mut HashMap<String, PolicyRecord>,
    sigs: &HashMap<String, UserSigRecord>,
) -> (Vec<Change>, Vec<Problem>) {
    let mut changes = Vec::new();
    let mut problems = Vec::new();

    let valid = valid_signatures(sigs);
    for (key, policy) in policies.iter_mut() {
        match policy.invalid {
            None => {
                if !requirements_satisfied(&policy.signature_requirements, &valid) {
                    info!(%key, "Policy no longer has its required signatures");
                    policy.set_invalid(InvalidReason::UnsatisfiedRequirements);
                    changes.push(Change::delete(Resource::Policy(policy.clone())));
                    problems.push(Problem::rejected(
                        policy.obj.clone(),
                        InvalidReason::UnsatisfiedRequirements,
                    ));
                }
            }
            Some(InvalidReason::UnsatisfiedRequirements) => {
                if requirements_satisfied(&policy.signature_requirements, &valid) {
                    info!(%key, "Policy signature requirements are now satisfied");
                    policy.set_valid();
                    changes.push(Change::add_or_update(Resource::Policy(policy.clone())));
                }
            }
            Some(_) => {}
        }
    }

    (changes, problems)
}

pub(crate) fn valid_signatures(sigs: &HashMap<String, UserSigRecord>) -> Vec<Signature<'_>> {
    sigs.values()
        .filter(|sig| sig.is_valid())
        .map(UserSigRecord::signature)
        .collect()
}
