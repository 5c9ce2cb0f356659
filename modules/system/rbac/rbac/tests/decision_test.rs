#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end decisions through the engine and the built-in evaluator.

use std::sync::Arc;

use rbac::{AuthzEngine, StaticRoleRegistry, SubjectCache, SubjectCacheConfig};
use rbac_sdk::{
    Action, Decision, Object, Permission, Role, Scope, ScopeRef, Subject, resources,
};

fn engine() -> AuthzEngine {
    AuthzEngine::with_cache(
        Arc::new(static_rbac_plugin::Service::new()),
        Arc::new(StaticRoleRegistry::new()),
        Arc::new(SubjectCache::new(&SubjectCacheConfig::default())),
    )
}

fn workspace_readers() -> Role {
    Role::new("workspace-reader").with_site(vec![Permission::allow(
        resources::WORKSPACE,
        Action::READ,
    )])
}

fn decide(subject: &Subject, action: &Action, object: &Object) -> Decision {
    engine().decide(subject, action, object).unwrap()
}

#[test]
fn site_grant_allows_any_object_of_the_type() {
    let subject = Subject::new("u1").with_roles(vec![workspace_readers()]);
    for object in [
        Object::new(resources::WORKSPACE),
        Object::new(resources::WORKSPACE).with_id("w1").in_org("o1"),
        Object::new(resources::WORKSPACE).with_id("w2").with_owner("u2"),
    ] {
        assert_eq!(decide(&subject, &Action::READ, &object), Decision::Allow);
    }
    assert_eq!(
        decide(&subject, &Action::READ, &Object::new(resources::TEMPLATE)),
        Decision::Deny
    );
}

#[test]
fn negate_from_a_second_role_denies() {
    let blocked = Role::new("no-workspaces").with_site(vec![Permission::deny(
        resources::WORKSPACE,
        Action::READ,
    )]);
    let subject = Subject::new("u1").with_roles(vec![workspace_readers(), blocked]);
    let object = Object::new(resources::WORKSPACE).with_id("w1");

    assert_eq!(decide(&subject, &Action::READ, &object), Decision::Deny);
}

#[test]
fn acl_user_grant_applies_only_to_that_object() {
    let subject = Subject::new("u1");
    let x = Object::new(resources::WORKSPACE)
        .with_id("x")
        .with_acl_user("u1", vec![Permission::allow(resources::WORKSPACE, Action::UPDATE)]);
    let y = Object::new(resources::WORKSPACE).with_id("y");

    assert_eq!(decide(&subject, &Action::UPDATE, &x), Decision::Allow);
    assert_eq!(decide(&subject, &Action::UPDATE, &y), Decision::Deny);
}

#[test]
fn allow_list_is_a_hard_ceiling() {
    let subject = Subject::new("u1")
        .with_role_names(["owner"])
        .with_scope(ScopeRef::Custom(
            Scope::new(Role::new("broad").with_site(vec![Permission::allow(
                resources::WILDCARD,
                Action::WILDCARD,
            )]))
            .with_allow_ids(["x"]),
        ));
    let shared_y = Object::new(resources::WORKSPACE)
        .with_id("y")
        .with_acl_user("u1", vec![Permission::allow(resources::WILDCARD, Action::WILDCARD)]);

    assert_eq!(
        decide(&subject, &Action::DELETE, &Object::new(resources::WORKSPACE).with_id("x")),
        Decision::Allow
    );
    assert_eq!(decide(&subject, &Action::DELETE, &shared_y), Decision::Deny);
}

#[test]
fn negation_dominates_at_every_level() {
    let grant = Permission::allow(resources::FILE, Action::WILDCARD);
    let deny = Permission::deny(resources::FILE, Action::DELETE);
    let object = Object::new(resources::FILE)
        .with_id("f1")
        .in_org("o1")
        .with_owner("u1");

    let roles = [
        Role::new("site").with_site(vec![grant.clone(), deny.clone()]),
        Role::new("org").with_org("o1", vec![grant.clone(), deny.clone()]),
        Role::new("user").with_user(vec![grant.clone(), deny.clone()]),
        Role::new("mixed")
            .with_site(vec![grant.clone()])
            .with_user(vec![deny.clone()]),
    ];
    for role in roles {
        let name = role.name.clone();
        let subject = Subject::new("u1").with_roles(vec![role]);
        assert_eq!(
            decide(&subject, &Action::DELETE, &object),
            Decision::Deny,
            "{name}"
        );
        assert_eq!(
            decide(&subject, &Action::READ, &object),
            Decision::Allow,
            "{name}"
        );
    }

    let acl_denied = object
        .clone()
        .with_acl_group("devs", vec![deny]);
    let subject = Subject::new("u1")
        .with_roles(vec![Role::new("site").with_site(vec![grant])])
        .with_groups(["devs"]);
    assert_eq!(decide(&subject, &Action::DELETE, &acl_denied), Decision::Deny);
}

#[test]
fn user_level_grants_need_ownership() {
    let subject = Subject::new("u1").with_role_names(["member"]);
    let mine = Object::new(resources::TEMPLATE).with_owner("u1");
    let theirs = Object::new(resources::TEMPLATE).with_owner("u2");
    let unowned = Object::new(resources::TEMPLATE);

    assert_eq!(decide(&subject, &Action::UPDATE, &mine), Decision::Allow);
    assert_eq!(decide(&subject, &Action::UPDATE, &theirs), Decision::Deny);
    assert_eq!(decide(&subject, &Action::UPDATE, &unowned), Decision::Deny);
}

#[test]
fn org_level_grants_need_a_matching_org() {
    let subject = Subject::new("u1").with_role_names(["organization-member:o1"]);

    let cases = [
        (Object::new(resources::TEMPLATE).in_org("o1"), Decision::Allow),
        (Object::new(resources::TEMPLATE).in_org("o2"), Decision::Deny),
        (Object::new(resources::TEMPLATE), Decision::Deny),
    ];
    for (object, expected) in cases {
        assert_eq!(
            decide(&subject, &Action::READ, &object),
            expected,
            "{:?}",
            object.org_id
        );
    }
}

#[test]
fn scope_role_must_grant_independently() {
    let subject = Subject::new("u1")
        .with_role_names(["owner"])
        .with_scope(ScopeRef::Builtin(rbac_sdk::ScopeName::new(
            rbac_sdk::ScopeName::APPLICATION_CONNECT,
        )));
    let workspace = Object::new(resources::WORKSPACE).with_id("w1");

    assert_eq!(
        decide(&subject, &Action::new("application_connect"), &workspace),
        Decision::Allow
    );
    assert_eq!(decide(&subject, &Action::READ, &workspace), Decision::Deny);
}

#[test]
fn custom_registered_roles_resolve_by_name() {
    let registry = Arc::new(StaticRoleRegistry::new());
    registry
        .register_role(
            Role::new("template-editor")
                .with_site(vec![Permission::allow(resources::TEMPLATE, Action::UPDATE)]),
        )
        .unwrap();
    let engine = AuthzEngine::with_cache(
        Arc::new(static_rbac_plugin::Service::new()),
        registry.clone(),
        Arc::new(SubjectCache::new(&SubjectCacheConfig::default())),
    );
    let subject = Subject::new("u1").with_role_names(["template-editor"]);
    let template = Object::new(resources::TEMPLATE).with_id("t1");

    assert!(engine.decide(&subject, &Action::UPDATE, &template).unwrap().is_allow());

    registry.remove_role("template-editor");
    let err: rbac_sdk::AuthzError = engine
        .decide(&subject, &Action::UPDATE, &template)
        .unwrap_err()
        .into();
    assert!(err.is_unknown_role());
}

#[test]
fn unknown_role_is_a_typed_error() {
    let subject = Subject::new("u1").with_role_names(["owner", "ghost"]);
    let err: rbac_sdk::AuthzError = engine()
        .decide(&subject, &Action::READ, &Object::new(resources::FILE))
        .unwrap_err()
        .into();
    assert!(err.is_unknown_role());
}

#[test]
fn decisions_are_deterministic_and_cached() {
    let engine = engine();
    let subject = Subject::new("u1")
        .with_role_names(["member", "auditor"])
        .with_groups(["g1"]);
    let objects = [
        Object::new(resources::AUDIT_LOG).with_id("a1"),
        Object::new(resources::WORKSPACE).with_owner("u1"),
        Object::new(resources::WORKSPACE).with_owner("u2"),
    ];

    let first: Vec<_> = objects
        .iter()
        .map(|o| engine.decide(&subject, &Action::READ, o).unwrap())
        .collect();
    for _ in 0..3 {
        let again: Vec<_> = objects
            .iter()
            .map(|o| engine.decide(&subject, &Action::READ, o).unwrap())
            .collect();
        assert_eq!(again, first);
    }
    assert_eq!(first, [Decision::Allow, Decision::Allow, Decision::Deny]);

    let stats = engine.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 11);
}

#[test]
fn cached_builtin_roles_decide_like_uncached_copies() {
    let engine = engine();
    let named = Subject::new("u1").with_role_names(["member"]);
    let inline = Subject::new("u1").with_roles(vec![
        Role::new("member")
            .with_site(vec![Permission::allow(resources::ORGANIZATION, Action::READ)])
            .with_user(vec![Permission::allow(resources::WILDCARD, Action::WILDCARD)]),
    ]);
    let objects = [
        Object::new(resources::ORGANIZATION).with_id("o1"),
        Object::new(resources::FILE).with_owner("u1"),
        Object::new(resources::FILE).with_owner("u2"),
    ];
    for object in &objects {
        for action in [Action::READ, Action::DELETE] {
            assert_eq!(
                engine.decide(&named, &action, object).unwrap(),
                engine.decide(&inline, &action, object).unwrap(),
                "{action} {object:?}"
            );
        }
    }
}

#[test]
fn rebuilt_roles_decide_from_their_current_permissions() {
    let engine = engine();
    let grant = vec![Permission::allow(resources::WORKSPACE, Action::READ)];
    let workspace = Object::new(resources::WORKSPACE).with_id("w1");

    let emptied = Subject::new("u1").with_roles(vec![
        Role::new("r")
            .with_site(grant.clone())
            .with_cached_value()
            .with_site(Vec::new()),
    ]);
    assert_eq!(
        engine.decide(&emptied, &Action::READ, &workspace).unwrap(),
        Decision::Deny
    );

    let widened = Subject::new("u2")
        .with_roles(vec![Role::new("r").with_cached_value().with_site(grant.clone())]);
    let plain = Subject::new("u2").with_roles(vec![Role::new("r").with_site(grant)]);
    assert_eq!(
        engine.decide(&widened, &Action::READ, &workspace).unwrap(),
        Decision::Allow
    );
    assert_eq!(
        engine.decide(&plain, &Action::READ, &workspace).unwrap(),
        Decision::Allow
    );
}
