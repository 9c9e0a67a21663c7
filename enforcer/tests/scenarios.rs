//! Enforcer behaviour shared by both strategies.
//!
//! Every test runs once per strategy through `rstest` cases.

use enforcer::{
    factory, AuthorizationContext, Enforcer, EnforcerError, EnforcerStrategy, JsonPointer,
    Permissions, PolicyEntry, PolicySnapshot, ResourceKey, SubjectId, READ, WRITE,
};
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

fn build_enforcer(strategy: EnforcerStrategy, entries: Vec<PolicyEntry>) -> Arc<dyn Enforcer> {
    let snapshot = entries
        .into_iter()
        .fold(PolicySnapshot::builder().policy_id("org.example:thing"), |b, e| b.entry(e))
        .build()
        .unwrap();
    factory::evaluator(strategy, &snapshot)
}

fn context(subjects: &[&str]) -> AuthorizationContext {
    AuthorizationContext::new(subjects.iter().copied())
}

fn names(subjects: &BTreeSet<SubjectId>) -> Vec<&str> {
    subjects.iter().map(SubjectId::as_str).collect()
}

#[fixture]
fn thing() -> Value {
    json!({
        "thingId": "org.example:thing",
        "policyId": "org.example:thing",
        "attributes": {
            "location": { "room": "lab", "floor": 2 },
            "manufacturer": "ACME"
        },
        "features": {
            "foo": { "properties": { "special": true, "value": 1 } },
            "firmware": { "properties": { "version": "1.2.3" } }
        }
    })
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_view_of_granted_attributes_only(#[case] strategy: EnforcerStrategy, thing: Value) {
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("attributes")
            .subject("sid_all_attributes")
            .grant(ResourceKey::thing("/attributes"), [READ, WRITE])],
    );

    let view = enforcer
        .build_json_view(
            &ResourceKey::thing("/"),
            &thing,
            &context(&["sid_all_attributes"]),
            &Permissions::read(),
        )
        .unwrap();
    assert_eq!(view, json!({ "attributes": thing["attributes"].clone() }));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_view_drops_revoked_feature(#[case] strategy: EnforcerStrategy, thing: Value) {
    let subject = "sid_features_read_firmware_read_revoke";
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("features")
            .subject(subject)
            .grant(ResourceKey::thing("/features"), [READ])
            .revoke(ResourceKey::thing("/features/firmware"), [READ])],
    );

    let view = enforcer
        .build_json_view(
            &ResourceKey::thing("/"),
            &thing,
            &context(&[subject]),
            &Permissions::read(),
        )
        .unwrap();
    assert_eq!(view, json!({ "features": { "foo": thing["features"]["foo"].clone() } }));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_deeper_grant_does_not_resurrect_revoked_subtree(
    #[case] strategy: EnforcerStrategy,
    thing: Value,
) {
    let subject = "sid_nonexistent_attribute_granted";
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("root")
            .subject(subject)
            .grant(ResourceKey::thing("/"), [READ])
            .revoke(ResourceKey::thing("/attributes"), [READ])
            .grant(ResourceKey::thing("/attributes/nonexistent"), [READ])],
    );

    let view = enforcer
        .build_json_view(
            &ResourceKey::thing("/attributes"),
            &thing["attributes"],
            &context(&[subject]),
            &Permissions::read(),
        )
        .unwrap();
    assert_eq!(view, json!({}));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_revoke_below_vetoes_unrestricted(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("owner")
            .subject("alice")
            .grant(ResourceKey::thing("/"), [READ, WRITE])
            .revoke(ResourceKey::thing("/features/firmware/properties"), [READ])],
    );
    let alice = context(&["alice"]);
    let root = ResourceKey::thing("/");

    assert!(!enforcer.has_unrestricted_permissions(&root, &alice, &Permissions::read()).unwrap());
    assert!(enforcer.has_unrestricted_permissions(&root, &alice, &Permissions::write()).unwrap());
    assert!(enforcer.has_partial_permissions(&root, &alice, &Permissions::read()).unwrap());
    assert!(enforcer
        .has_unrestricted_permissions(
            &ResourceKey::thing("/attributes"),
            &alice,
            &Permissions::read()
        )
        .unwrap());
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_subjects_with_permission_is_exact_node(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![
            PolicyEntry::new("ancestor")
                .subject("on_features")
                .grant(ResourceKey::thing("/features"), [READ]),
            PolicyEntry::new("exact")
                .subject("on_foo")
                .grant(ResourceKey::thing("/features/foo"), [READ]),
            PolicyEntry::new("descendant")
                .subject("on_special")
                .grant(ResourceKey::thing("/features/foo/properties/special"), [READ]),
            PolicyEntry::new("revoked")
                .subject("revoked_on_foo")
                .revoke(ResourceKey::thing("/features/foo"), [READ, WRITE]),
        ],
    );

    let effected = enforcer
        .subjects_with_permission(&ResourceKey::thing("/features/foo"), &Permissions::read())
        .unwrap();
    assert_eq!(names(effected.granted()), ["on_foo"]);
    assert_eq!(names(effected.revoked()), ["revoked_on_foo"]);

    let missing = enforcer
        .subjects_with_permission(&ResourceKey::thing("/features/bar"), &Permissions::read())
        .unwrap();
    assert!(missing.granted().is_empty() && missing.revoked().is_empty());
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_deeper_grant_overrides_revoke(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("mixed")
            .subject("alice")
            .grant(ResourceKey::thing("/"), [READ])
            .revoke(ResourceKey::thing("/features"), [READ])
            .grant(ResourceKey::thing("/features/foo"), [READ])],
    );
    let alice = context(&["alice"]);
    let read = Permissions::read();

    let unrestricted = |path: &str| {
        enforcer
            .has_unrestricted_permissions(&ResourceKey::thing(path), &alice, &read)
            .unwrap()
    };

    assert!(unrestricted("/attributes/x"));
    assert!(!unrestricted("/features/bar"));
    assert!(unrestricted("/features/foo/properties"));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_revoke_wins_at_same_node(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![
            PolicyEntry::new("grant")
                .subject("alice")
                .grant(ResourceKey::thing("/attributes"), [READ]),
            PolicyEntry::new("revoke")
                .subject("alice")
                .revoke(ResourceKey::thing("/attributes"), [READ]),
        ],
    );
    let alice = context(&["alice"]);
    let attributes = ResourceKey::thing("/attributes");

    assert!(!enforcer
        .has_unrestricted_permissions(&attributes, &alice, &Permissions::read())
        .unwrap());
    // Partial permission ignores revokes.
    assert!(enforcer.has_partial_permissions(&attributes, &alice, &Permissions::read()).unwrap());

    let effected = enforcer.subjects_with_permission(&attributes, &Permissions::read()).unwrap();
    assert_eq!(effected.granted(), effected.revoked(), "sets may overlap");
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_context_matches_if_any_subject_matches(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![
            PolicyEntry::new("readers")
                .subject("group:readers")
                .grant(ResourceKey::thing("/"), [READ]),
            PolicyEntry::new("writers")
                .subject("group:writers")
                .grant(ResourceKey::thing("/"), [WRITE]),
        ],
    );
    let root = ResourceKey::thing("/");
    let both = Permissions::new([READ, WRITE]);

    assert!(enforcer
        .has_unrestricted_permissions(
            &root,
            &context(&["alice", "group:readers"]),
            &Permissions::read()
        )
        .unwrap());
    assert!(!enforcer
        .has_unrestricted_permissions(&root, &context(&["alice"]), &Permissions::read())
        .unwrap());
    assert!(!enforcer
        .has_unrestricted_permissions(&root, &context(&[]), &Permissions::read())
        .unwrap());
    // Each permission may be held by a different subject of the context.
    assert!(enforcer
        .has_unrestricted_permissions(&root, &context(&["group:readers", "group:writers"]), &both)
        .unwrap());
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_unknown_namespace_is_denied(#[case] strategy: EnforcerStrategy, thing: Value) {
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("things")
            .subject("alice")
            .grant(ResourceKey::thing("/"), [READ])],
    );
    let alice = context(&["alice"]);
    let message = ResourceKey::message("/");
    let read = Permissions::read();

    assert!(!enforcer.has_partial_permissions(&message, &alice, &read).unwrap());
    assert!(!enforcer.has_unrestricted_permissions(&message, &alice, &read).unwrap());
    assert!(enforcer.subjects_with_partial_permission(&message, &read).unwrap().is_empty());
    assert_eq!(enforcer.build_json_view(&message, &thing, &alice, &read).unwrap(), json!({}));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_empty_permissions_are_rejected(#[case] strategy: EnforcerStrategy, thing: Value) {
    let enforcer = build_enforcer(strategy, vec![]);
    let alice = context(&["alice"]);
    let root = ResourceKey::thing("/");
    let none = Permissions::default();

    assert!(matches!(
        enforcer.has_unrestricted_permissions(&root, &alice, &none),
        Err(EnforcerError::EmptyPermissions)
    ));
    assert!(matches!(
        enforcer.classify_subjects(&root, &none),
        Err(EnforcerError::EmptyPermissions)
    ));
    assert!(matches!(
        enforcer.build_json_view(&root, &thing, &alice, &none),
        Err(EnforcerError::EmptyPermissions)
    ));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_classification(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![
            PolicyEntry::new("owner")
                .subject("owner")
                .grant(ResourceKey::thing("/"), [READ]),
            PolicyEntry::new("auditor")
                .subject("auditor")
                .grant(ResourceKey::thing("/features"), [READ])
                .revoke(ResourceKey::thing("/features/firmware"), [READ]),
            PolicyEntry::new("device")
                .subject("device")
                .grant(ResourceKey::thing("/features/firmware/properties"), [READ]),
            PolicyEntry::new("outsider")
                .subject("outsider")
                .grant(ResourceKey::thing("/attributes"), [READ]),
        ],
    );
    let features = ResourceKey::thing("/features");
    let read = Permissions::read();

    let classification = enforcer.classify_subjects(&features, &read).unwrap();
    assert_eq!(names(classification.unrestricted()), ["owner"]);
    assert_eq!(names(classification.partial_only()), ["auditor", "device"]);
    assert_eq!(names(classification.effected_granted()), ["auditor"]);

    let partial = enforcer.subjects_with_partial_permission(&features, &read).unwrap();
    assert_eq!(names(&partial), ["auditor", "device", "owner"]);
    let unrestricted = enforcer.subjects_with_unrestricted_permission(&features, &read).unwrap();
    assert_eq!(names(&unrestricted), ["owner"]);
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_partial_requires_all_permissions_at_one_node(#[case] strategy: EnforcerStrategy) {
    let enforcer = build_enforcer(
        strategy,
        vec![
            PolicyEntry::new("split")
                .subject("alice")
                .grant(ResourceKey::thing("/features/a"), [READ])
                .grant(ResourceKey::thing("/features/b"), [WRITE]),
            PolicyEntry::new("inherited")
                .subject("bob")
                .grant(ResourceKey::thing("/features"), [READ])
                .grant(ResourceKey::thing("/features/b/properties"), [WRITE]),
        ],
    );
    let features = ResourceKey::thing("/features");
    let both = Permissions::new([READ, WRITE]);

    let partial = enforcer.subjects_with_partial_permission(&features, &both).unwrap();
    assert_eq!(names(&partial), ["bob"], "alice holds READ and WRITE on siblings only");
    assert!(!enforcer
        .has_partial_permissions(&features, &context(&["alice"]), &both)
        .unwrap());
    assert!(enforcer
        .has_partial_permissions(&features, &context(&["bob"]), &both)
        .unwrap());

    let classification = enforcer.classify_subjects(&features, &both).unwrap();
    assert!(classification.unrestricted().is_empty());
    assert_eq!(names(classification.partial_only()), ["bob"]);

    let only_a = ResourceKey::thing("/features/a");
    let read = Permissions::read();
    let partial = enforcer.subjects_with_partial_permission(&only_a, &read).unwrap();
    assert_eq!(names(&partial), ["alice", "bob"]);
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_allowlist_applies_to_relevant_contexts(#[case] strategy: EnforcerStrategy, thing: Value) {
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("location")
            .subject("alice")
            .grant(ResourceKey::thing("/attributes/location"), [READ])],
    );
    let allowlist = [JsonPointer::parse("/thingId"), JsonPointer::parse("/policyId")];
    let root = ResourceKey::thing("/");

    let view = enforcer
        .build_json_view_with_allowlist(
            &root,
            &thing,
            &context(&["alice"]),
            &allowlist,
            &Permissions::read(),
        )
        .unwrap();
    assert_eq!(
        view,
        json!({
            "thingId": "org.example:thing",
            "policyId": "org.example:thing",
            "attributes": { "location": { "room": "lab", "floor": 2 } }
        })
    );

    let stranger = enforcer
        .build_json_view_with_allowlist(
            &root,
            &thing,
            &context(&["mallory"]),
            &allowlist,
            &Permissions::read(),
        )
        .unwrap();
    assert_eq!(stranger, json!({}));
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_accessible_paths(#[case] strategy: EnforcerStrategy, thing: Value) {
    let enforcer = build_enforcer(
        strategy,
        vec![PolicyEntry::new("features")
            .subject("alice")
            .grant(ResourceKey::thing("/features"), [READ])
            .revoke(ResourceKey::thing("/features/foo/properties/special"), [READ])],
    );

    let paths: Vec<String> = enforcer
        .accessible_paths(
            &ResourceKey::thing("/"),
            &thing,
            &context(&["alice"]),
            &Permissions::read(),
        )
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        paths,
        [
            "thing:/features/firmware/properties/version",
            "thing:/features/foo/properties/value",
        ]
    );
}

#[rstest]
#[case::trie(EnforcerStrategy::ThroughputOptimized)]
#[case::tree(EnforcerStrategy::MemoryOptimized)]
fn test_policy_document_round_trip(#[case] strategy: EnforcerStrategy) {
    let snapshot = PolicySnapshot::from_json_value(json!({
        "policyId": "org.example:doc",
        "revision": 3,
        "entries": {
            "OWNER": {
                "subjects": { "oauth2:alice": { "type": "user" } },
                "resources": {
                    "thing:/": { "grant": ["READ", "WRITE"], "revoke": [] },
                    "thing:/attributes/secret": { "revoke": ["READ"] }
                }
            }
        }
    }))
    .unwrap();
    let enforcer = factory::evaluator(strategy, &snapshot);

    assert_eq!(enforcer.policy_id(), Some("org.example:doc"));
    assert_eq!(enforcer.revision(), Some(3));
    let alice = context(&["oauth2:alice"]);
    assert!(enforcer
        .has_unrestricted_permissions(&ResourceKey::thing("/"), &alice, &Permissions::write())
        .unwrap());
    assert!(!enforcer
        .has_unrestricted_permissions(&ResourceKey::thing("/"), &alice, &Permissions::read())
        .unwrap());
}
