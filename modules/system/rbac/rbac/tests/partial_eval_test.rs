#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Listing predicates agree with single decisions, and compiled scopes agree
//! with predicates, over generated subjects and objects.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use authz_db::{AclEntry, ScopableRow, row_matches};
use authz_scope::properties;
use proptest::prelude::*;
use rbac::{AuthzEngine, StaticRoleRegistry, SubjectCache, SubjectCacheConfig};
use rbac_sdk::pep::compile_to_access_scope;
use rbac_sdk::{Action, Object, Permission, Role, Scope, ScopeRef, Subject, resources};

static ENGINE: LazyLock<AuthzEngine> = LazyLock::new(|| {
    AuthzEngine::with_cache(
        Arc::new(static_rbac_plugin::Service::new()),
        Arc::new(StaticRoleRegistry::new()),
        Arc::new(SubjectCache::new(&SubjectCacheConfig::default())),
    )
});

/// Storage view of an object, keyed the way the compiled scope expects.
struct ObjectRow<'a>(&'a Object);

impl ScopableRow for ObjectRow<'_> {
    fn resolve_property(&self, property: &str) -> Option<&str> {
        match property {
            properties::ORG_ID => Some(&self.0.org_id),
            properties::OWNER_ID => Some(&self.0.owner),
            properties::RESOURCE_ID => Some(&self.0.id),
            _ => None,
        }
    }

    fn acl_entries(&self, principal_key: &str) -> Vec<AclEntry<'_>> {
        let permissions = if let Some(user) = principal_key.strip_prefix("user:") {
            self.0.acl_user_list.get(user)
        } else if let Some(group) = principal_key.strip_prefix("group:") {
            self.0.acl_group_list.get(group)
        } else {
            None
        };
        permissions
            .into_iter()
            .flatten()
            .map(|p| AclEntry {
                resource_type: &p.resource_type,
                action: p.action.as_str(),
                negate: p.negate,
            })
            .collect()
    }
}

fn arb_permission() -> impl Strategy<Value = Permission> {
    (
        prop_oneof![
            Just(resources::WORKSPACE),
            Just(resources::FILE),
            Just(resources::WILDCARD)
        ],
        prop_oneof![Just(Action::READ), Just(Action::DELETE), Just(Action::WILDCARD)],
        prop::bool::weighted(0.2),
    )
        .prop_map(|(resource_type, action, negate)| {
            if negate {
                Permission::deny(resource_type, action)
            } else {
                Permission::allow(resource_type, action)
            }
        })
}

fn arb_permissions() -> impl Strategy<Value = Vec<Permission>> {
    prop::collection::vec(arb_permission(), 0..3)
}

fn arb_role(name: &'static str) -> impl Strategy<Value = Role> {
    (
        arb_permissions(),
        prop::collection::btree_map(prop_oneof![Just("o1"), Just("o2")], arb_permissions(), 0..2),
        arb_permissions(),
    )
        .prop_map(move |(site, org, user)| {
            org.into_iter()
                .fold(Role::new(name).with_site(site).with_user(user), |role, (id, perms)| {
                    role.with_org(id, perms)
                })
        })
}

fn arb_scope() -> impl Strategy<Value = ScopeRef> {
    prop_oneof![
        2 => Just(ScopeRef::default()),
        3 => (
            arb_role("scope"),
            prop::collection::btree_set(prop_oneof![Just("w1"), Just("w2")], 0..2),
        )
            .prop_map(|(role, ids)| ScopeRef::Custom(Scope::new(role).with_allow_ids(ids))),
    ]
}

fn arb_subject() -> impl Strategy<Value = Subject> {
    (
        prop::collection::vec(prop_oneof![arb_role("a"), arb_role("b")], 0..3),
        arb_scope(),
        prop::collection::btree_set(prop_oneof![Just("g1"), Just("g2")], 0..2),
    )
        .prop_map(|(roles, scope, groups)| {
            Subject::new("u1")
                .with_roles(roles)
                .with_scope(scope)
                .with_groups(groups)
        })
}

fn arb_acl(keys: [&'static str; 2]) -> impl Strategy<Value = BTreeMap<String, Vec<Permission>>> {
    prop::collection::btree_map(
        prop_oneof![Just(keys[0].to_owned()), Just(keys[1].to_owned())],
        arb_permissions(),
        0..2,
    )
}

fn arb_object() -> impl Strategy<Value = Object> {
    (
        prop_oneof![Just(resources::WORKSPACE), Just(resources::FILE)],
        prop_oneof![Just(""), Just("w1"), Just("w2"), Just("w3")],
        prop_oneof![Just(""), Just("u1"), Just("u2")],
        prop_oneof![Just(""), Just("o1"), Just("o2"), Just("o3")],
        arb_acl(["u1", "u2"]),
        arb_acl(["g1", "g3"]),
    )
        .prop_map(|(resource_type, id, owner, org, users, groups)| Object {
            acl_user_list: users,
            acl_group_list: groups,
            ..Object::new(resource_type).with_id(id).with_owner(owner).in_org(org)
        })
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::READ), Just(Action::DELETE)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn predicate_agrees_with_decide(
        subject in arb_subject(),
        action in arb_action(),
        object in arb_object(),
    ) {
        let decision = ENGINE.decide(&subject, &action, &object).unwrap();
        let predicate = ENGINE.scope(&subject, &action, &object.resource_type).unwrap();
        prop_assert_eq!(predicate.matches(&object), decision.is_allow(), "{:?}", predicate);
    }

    #[test]
    fn compiled_scope_agrees_with_predicate(
        subject in arb_subject(),
        action in arb_action(),
        object in arb_object(),
    ) {
        let predicate = ENGINE.scope(&subject, &action, &object.resource_type).unwrap();
        let scope = compile_to_access_scope(&predicate);
        prop_assert_eq!(
            row_matches(&scope, &ObjectRow(&object)),
            predicate.matches(&object),
            "{:?}",
            scope
        );
    }

    #[test]
    fn excluded_objects_are_denied(
        subject in arb_subject(),
        action in arb_action(),
        object in arb_object(),
    ) {
        let prepared = ENGINE.prepare(&subject, &action, &object.resource_type).unwrap();
        if !row_matches(prepared.access_scope(), &ObjectRow(&object)) {
            prop_assert!(!ENGINE.decide(&subject, &action, &object).unwrap().is_allow());
        }
    }
}

#[test]
fn acl_only_subject_lists_through_row_acls() {
    let subject = Subject::new("u1").with_groups(["g1"]);
    let prepared = ENGINE
        .prepare(&subject, &Action::READ, resources::FILE)
        .unwrap();
    assert!(prepared.predicate().acl_only());
    assert!(prepared.access_scope().requires_acl_check());

    let shared = Object::new(resources::FILE)
        .with_id("f1")
        .with_acl_group("g1", vec![Permission::allow(resources::FILE, Action::READ)]);
    let private = Object::new(resources::FILE).with_id("f2");
    assert!(row_matches(prepared.access_scope(), &ObjectRow(&shared)));
    assert!(!row_matches(prepared.access_scope(), &ObjectRow(&private)));
}
