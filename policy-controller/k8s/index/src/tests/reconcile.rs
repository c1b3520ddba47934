use super::*;
use crate::{
    policy::{parse_signature_requirements, PolicyRecord},
    reconcile::{reconcile_policies, reconcile_tags},
    user_sig::UserSigRecord,
};
use pretty_assertions::assert_eq;
use waf_policy_controller_k8s_api::RequiredFields;

#[test]
fn reconcile_is_idempotent() {
    let mut config = Configuration::new();
    config.add_or_update_user_sig(mk_user_sig("sig1", "1", "2020-01-23T18:32:02Z", "test"));
    config.add_or_update_user_sig(mk_user_sig("sig2", "2", "2020-01-25T18:32:02Z", "test"));
    config.add_or_update_policy(mk_policy("policy", json!([{ "tag": "missing" }])));

    let (changes, problems) = config.reconcile();
    assert!(changes.is_empty(), "{changes:?}");
    assert!(problems.is_empty(), "{problems:?}");
}

#[test]
fn reconcile_reports_only_flipped_records() {
    let mut config = Configuration::new();
    config.add_or_update_user_sig(mk_user_sig("sig1", "1", "2020-01-23T18:32:02Z", "t1"));
    config.add_or_update_user_sig(mk_user_sig("sig2", "2", "2020-01-25T18:32:02Z", "t1"));
    config.add_or_update_policy(mk_policy("valid", json!([{ "tag": "t1" }])));
    config.add_or_update_policy(mk_policy("pending", json!([{ "tag": "t2" }])));

    let (changes, problems) = config.delete_user_sig(&key("sig1"));
    assert!(problems.is_empty());
    assert_eq!(names(&changes.user_sigs), vec!["sig2"]);
    assert!(changes.policy_additions_or_updates.is_empty());
    assert!(changes.policy_deletions.is_empty());

    let (changes, problems) = config.reconcile();
    assert!(changes.is_empty());
    assert!(problems.is_empty());
}

#[test]
fn tag_ownership_flips_are_reported() {
    let mut config = Configuration::new();
    config.add_or_update_user_sig(mk_user_sig("sig1", "1", "2020-01-23T18:32:02Z", "test"));
    config.add_or_update_user_sig(mk_user_sig("sig2", "2", "2020-01-25T18:32:02Z", "test"));
    config.add_or_update_policy(mk_policy("policy", json!([{ "tag": "test" }])));

    let (changes, problems) = config.add_or_update_user_sig(mk_user_sig(
        "sig0",
        "0",
        "2020-01-20T18:32:02Z",
        "test",
    ));
    assert_eq!(
        messages(&problems),
        vec![("sig1".to_string(), "Duplicate tag set".to_string())]
    );
    assert_eq!(names(&changes.user_sigs), vec!["sig0"]);
    assert!(changes.policy_deletions.is_empty());
    assert!(changes.policy_additions_or_updates.is_empty());
    assert_consistent(&config);
}

#[test]
fn policy_changes_from_reconciliation() {
    let mut config = Configuration::new();
    config.add_or_update_policy(mk_policy("a", json!([{ "tag": "t1" }])));
    config.add_or_update_policy(mk_policy("b", json!([{ "tag": "t2" }])));
    config.add_or_update_user_sig(mk_user_sig("sig", "1", "2020-01-23T18:32:02Z", "t1"));
    assert!(config.policy(&key("a")).unwrap().is_valid());

    // Retag the signature so that it satisfies the other policy.
    let (change, problems) =
        config.add_or_update_user_sig(mk_user_sig("sig", "1", "2020-01-23T18:32:02Z", "t2"));
    assert_eq!(
        messages(&problems),
        vec![(
            "a".to_string(),
            "Policy has unsatisfied signature requirements".to_string()
        )]
    );
    assert_eq!(names(&change.policy_additions_or_updates), vec!["b"]);
    assert_eq!(names(&change.policy_deletions), vec!["a"]);
}

#[test]
fn reconcile_change_ops() {
    let mut sigs = HashMap::new();
    for (name, uid, created) in [
        ("sig1", "1", "2020-01-23T18:32:02Z"),
        ("sig2", "2", "2020-01-25T18:32:02Z"),
    ] {
        let sig = UserSigRecord::parse(
            Arc::new(mk_user_sig(name, uid, created, "test")),
            &RequiredFields,
        );
        sigs.insert(key(name), sig);
    }

    let mut policies = HashMap::new();
    let obj = Arc::new(mk_policy("policy", json!([{ "tag": "other" }])));
    let reqs = parse_signature_requirements(&obj, &RequiredFields).unwrap();
    policies.insert(key("policy"), PolicyRecord::new(obj, reqs));

    let (changes, problems) = reconcile_tags(&mut sigs);
    assert_eq!(
        ops(&changes),
        vec![(Op::Delete, Kind::UserSig, "sig2".to_string())]
    );
    assert_eq!(
        messages(&problems),
        vec![("sig2".to_string(), "Duplicate tag set".to_string())]
    );

    let (changes, problems) = reconcile_policies(&mut policies, &sigs);
    assert_eq!(
        ops(&changes),
        vec![(Op::Delete, Kind::Policy, "policy".to_string())]
    );
    assert!(changes.iter().all(is_policy));
    assert_eq!(problems.len(), 1);

    assert!(reconcile_tags(&mut sigs).0.is_empty());
    assert!(reconcile_policies(&mut policies, &sigs).0.is_empty());
}

#[test]
fn invariants_hold_across_mutations() {
    let mut config = Configuration::new();
    let steps: Vec<Box<dyn Fn(&mut Configuration)>> = vec![
        Box::new(|c: &mut Configuration| {
            c.add_or_update_policy(mk_policy(
                "p1",
                json!([{ "tag": "t1", "minRevisionDatetime": "2020-01-01T00:00:00Z" }]),
            ));
        }),
        Box::new(|c: &mut Configuration| {
            c.add_or_update_policy(mk_policy("p2", json!([{ "tag": "t2" }, { "tag": "t1" }])));
        }),
        Box::new(|c: &mut Configuration| {
            c.add_or_update_user_sig(with_revision(
                mk_user_sig("s1", "1", "2020-01-23T18:32:02Z", "t1"),
                "2019-06-01T00:00:00Z",
            ));
        }),
        Box::new(|c: &mut Configuration| {
            c.add_or_update_user_sig(with_revision(
                mk_user_sig("s2", "2", "2020-01-24T18:32:02Z", "t1"),
                "2020-06-01T00:00:00Z",
            ));
        }),
        Box::new(|c: &mut Configuration| {
            c.add_or_update_user_sig(mk_user_sig("s3", "3", "2020-01-25T18:32:02Z", "t2"));
        }),
        Box::new(|c: &mut Configuration| {
            c.delete_user_sig(&key("s1"));
        }),
        Box::new(|c: &mut Configuration| {
            c.add_or_update_user_sig(with_revision(
                mk_user_sig("s2", "2", "2020-01-24T18:32:02Z", "t1"),
                "nope",
            ));
        }),
        Box::new(|c: &mut Configuration| {
            c.add_or_update_user_sig(mk_user_sig("s4", "4", "2020-01-24T18:32:02Z", "t2"));
        }),
        Box::new(|c: &mut Configuration| {
            c.delete_policy(&key("p1"));
        }),
        Box::new(|c: &mut Configuration| {
            c.delete_user_sig(&key("s4"));
        }),
    ];

    for step in steps {
        step(&mut config);
        assert_consistent(&config);
        let (changes, problems) = config.reconcile();
        assert!(changes.is_empty());
        assert!(problems.is_empty());
    }

    assert!(config.policy(&key("p1")).is_none());
    assert!(!config.policy(&key("p2")).unwrap().is_valid());
    assert!(config.user_sig(&key("s3")).unwrap().is_valid());
}
