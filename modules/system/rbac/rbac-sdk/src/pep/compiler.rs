//! PEP predicate compiler.
//!
//! Compiles a partial-evaluation [`Predicate`] into an `AccessScope` that a
//! storage layer ANDs into its listing query. The scope applies to rows of
//! the predicate's resource type.
//!
//! ## Decision Matrix (fail-closed)
//!
//! | predicate | Result |
//! |-----------|--------|
//! | blanket deny, empty ceiling or empty allow-list | `deny_all()` |
//! | otherwise | OR over (subject grant path × scope ceiling path) |
//!
//! Subject grant paths are site, `org_id IN allow_orgs`, `owner_id = subject`
//! and a per-row ACL grant. Scope ceiling paths are site, `org_id IN
//! ceiling.orgs` and `owner_id = subject`. Every path is AND-ed with the
//! allow-list, the org / own negations and an ACL no-deny check, so the
//! result selects exactly the rows [`Predicate::matches`] accepts.

use std::collections::BTreeSet;

use authz_scope::{
    AccessScope, AclRequirement, FilterOp, ScopeConstraint, ScopeFilter, acl_group_key,
    acl_user_key, properties,
};

use crate::predicate::Predicate;

#[derive(Debug, Clone, Copy)]
enum GrantPath<'a> {
    Site,
    Orgs(&'a BTreeSet<String>),
    Own,
    Acl,
}

/// Compile a predicate into an `AccessScope`.
///
/// Never fails: anything the predicate cannot allow compiles to `deny_all()`.
#[must_use]
pub fn compile_to_access_scope(predicate: &Predicate) -> AccessScope {
    if predicate.is_deny_all() {
        return AccessScope::deny_all();
    }

    let has_owner = !predicate.subject_id.is_empty();
    let allow_orgs = non_empty(&predicate.allow_orgs);
    let ceiling_orgs = non_empty(&predicate.ceiling.orgs);

    let mut subject_paths = Vec::new();
    if predicate.allow_site {
        subject_paths.push(GrantPath::Site);
    }
    if !allow_orgs.is_empty() {
        subject_paths.push(GrantPath::Orgs(&allow_orgs));
    }
    if predicate.allow_own && has_owner {
        subject_paths.push(GrantPath::Own);
    }
    subject_paths.push(GrantPath::Acl);

    let mut scope_paths = Vec::new();
    if predicate.ceiling.site {
        scope_paths.push(GrantPath::Site);
    }
    if !ceiling_orgs.is_empty() {
        scope_paths.push(GrantPath::Orgs(&ceiling_orgs));
    }
    if predicate.ceiling.own && has_owner {
        scope_paths.push(GrantPath::Own);
    }

    let guards = guard_filters(predicate);
    let mut constraints = Vec::new();
    for subject in &subject_paths {
        for scope in &scope_paths {
            if let Some(mut filters) = combine(predicate, *subject, *scope) {
                filters.extend(guards.iter().cloned());
                constraints.push(ScopeConstraint::new(filters));
            }
        }
    }

    AccessScope::from_constraints(constraints).with_acl_requirement(AclRequirement::new(
        predicate.resource_type.as_str(),
        predicate.action.as_str(),
    ))
}

/// Filters for one (subject path, scope path) pair; `None` if they cannot overlap.
fn combine(predicate: &Predicate, subject: GrantPath<'_>, scope: GrantPath<'_>) -> Option<Vec<ScopeFilter>> {
    let mut filters = Vec::new();
    let mut orgs: Option<BTreeSet<&String>> = None;
    let mut own = false;

    for path in [subject, scope] {
        match path {
            GrantPath::Site => {}
            GrantPath::Orgs(set) => {
                orgs = Some(match orgs {
                    Some(prev) => prev.into_iter().filter(|o| set.contains(*o)).collect(),
                    None => set.iter().collect(),
                });
            }
            GrantPath::Own => own = true,
            GrantPath::Acl => filters.push(ScopeFilter::new(
                properties::ACL,
                FilterOp::AclGrants,
                principals(predicate),
            )),
        }
    }

    if let Some(orgs) = orgs {
        if orgs.is_empty() {
            return None;
        }
        filters.push(ScopeFilter::is_in(
            properties::ORG_ID,
            orgs.into_iter().cloned().collect(),
        ));
    }
    if own {
        filters.push(ScopeFilter::is_in(
            properties::OWNER_ID,
            vec![predicate.subject_id.clone()],
        ));
    }
    Some(filters)
}

/// Restrictions shared by every access path.
fn guard_filters(predicate: &Predicate) -> Vec<ScopeFilter> {
    let mut guards = Vec::new();
    if let Some(ids) = &predicate.allow_ids {
        guards.push(ScopeFilter::is_in(
            properties::RESOURCE_ID,
            ids.iter().cloned().collect(),
        ));
    }
    let deny_orgs = non_empty(&predicate.deny_orgs);
    if !deny_orgs.is_empty() {
        guards.push(ScopeFilter::not_in(
            properties::ORG_ID,
            deny_orgs.into_iter().collect(),
        ));
    }
    if predicate.deny_own && !predicate.subject_id.is_empty() {
        guards.push(ScopeFilter::not_in(
            properties::OWNER_ID,
            vec![predicate.subject_id.clone()],
        ));
    }
    guards.push(ScopeFilter::new(
        properties::ACL,
        FilterOp::AclNoDeny,
        principals(predicate),
    ));
    guards
}

fn principals(predicate: &Predicate) -> Vec<String> {
    std::iter::once(acl_user_key(&predicate.subject_id))
        .chain(predicate.groups.iter().map(|g| acl_group_key(g)))
        .collect()
}

/// Empty org IDs never match an object, so they never reach storage.
fn non_empty(orgs: &BTreeSet<String>) -> BTreeSet<String> {
    orgs.iter().filter(|o| !o.is_empty()).cloned().collect()
}
