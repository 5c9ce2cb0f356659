use authz_scope::{AccessScope, AclRequirement, FilterOp, ScopeConstraint, ScopeFilter, properties};

use super::ScopableRow;

/// Returns `true` if the row is visible under the scope.
///
/// # OR/AND Semantics
///
/// - Multiple constraints are OR-ed (alternative access paths)
/// - Filters within a constraint are AND-ed (all must match)
/// - Unknown properties fail that constraint (fail-closed)
/// - ACL filters without an ACL requirement on the scope fail (fail-closed)
///
/// # Policy Rules
///
/// | Scope | Behavior |
/// |-------|----------|
/// | deny-all (default) | no rows |
/// | unconstrained (allow-all) | every row |
/// | single constraint | AND of resolved filters |
/// | multiple constraints | OR of ANDed filter groups |
pub fn row_matches<R>(scope: &AccessScope, row: &R) -> bool
where
    R: ScopableRow + ?Sized,
{
    if scope.is_unconstrained() {
        return true;
    }
    if scope.is_deny_all() {
        return false;
    }
    scope
        .constraints()
        .iter()
        .any(|c| constraint_matches(scope.acl_requirement(), c, row).unwrap_or(false))
}

/// Evaluate a single constraint (AND of filters).
///
/// Returns `None` if any filter cannot be resolved against the row.
fn constraint_matches<R>(
    acl: Option<&AclRequirement>,
    constraint: &ScopeConstraint,
    row: &R,
) -> Option<bool>
where
    R: ScopableRow + ?Sized,
{
    for filter in constraint.filters() {
        if !filter_matches(acl, filter, row)? {
            return Some(false);
        }
    }
    Some(true)
}

fn filter_matches<R>(acl: Option<&AclRequirement>, filter: &ScopeFilter, row: &R) -> Option<bool>
where
    R: ScopableRow + ?Sized,
{
    match filter.op() {
        FilterOp::In => {
            let value = row.resolve_property(filter.property())?;
            Some(filter.values().iter().any(|v| v == value))
        }
        FilterOp::NotIn => {
            let value = row.resolve_property(filter.property())?;
            Some(!filter.values().iter().any(|v| v == value))
        }
        FilterOp::AclGrants | FilterOp::AclNoDeny => {
            if filter.property() != properties::ACL {
                return None;
            }
            let requirement = acl?;
            let (granted, denied) = acl_outcome(requirement, filter.values(), row);
            Some(if filter.op() == FilterOp::AclGrants {
                granted
            } else {
                !denied
            })
        }
    }
}

/// Scan the row ACL for the given principals: `(any grant, any deny)`.
fn acl_outcome<R>(requirement: &AclRequirement, principals: &[String], row: &R) -> (bool, bool)
where
    R: ScopableRow + ?Sized,
{
    let mut granted = false;
    let mut denied = false;
    for key in principals {
        for entry in row.acl_entries(key) {
            if !requirement.is_matched_by(entry.resource_type, entry.action) {
                continue;
            }
            if entry.negate {
                denied = true;
            } else {
                granted = true;
            }
        }
    }
    (granted, denied)
}
