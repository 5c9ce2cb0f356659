/// Matches any resource type or action when used as a permission pattern.
pub const WILDCARD: &str = "*";

/// Returns `true` if `pattern` is the wildcard or equals `value`.
#[inline]
#[must_use]
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

/// Well-known authorization property names.
///
/// Shared between the scoping compiler and storage adapters
/// (`ScopableRow::resolve_property()`).
pub mod properties {
    /// Owning organization. Typically maps to an `organization_id` column.
    pub const ORG_ID: &str = "org_id";

    /// Resource identity. Typically maps to the primary key column.
    pub const RESOURCE_ID: &str = "id";

    /// Owner (user) identity. Typically maps to an `owner_id` column.
    pub const OWNER_ID: &str = "owner_id";

    /// Per-row access-control lists. Only used with the ACL filter ops.
    pub const ACL: &str = "acl";
}

/// ACL lookup key for a user principal.
#[must_use]
pub fn acl_user_key(user_id: &str) -> String {
    format!("user:{user_id}")
}

/// ACL lookup key for a group principal.
#[must_use]
pub fn acl_group_key(group_id: &str) -> String {
    format!("group:{group_id}")
}

/// Predicate operation type for scope filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// `property IN (values)`.
    In,
    /// `property NOT IN (values)`. A missing (empty) property satisfies it.
    NotIn,
    /// The row ACL grants the scope's [`AclRequirement`] to any principal in `values`.
    AclGrants,
    /// The row ACL holds no deny for the scope's [`AclRequirement`] for any principal in `values`.
    AclNoDeny,
}

/// A single scope filter: a condition on a named resource property.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScopeFilter {
    property: String,
    op: FilterOp,
    values: Vec<String>,
}

impl ScopeFilter {
    #[must_use]
    pub fn new(property: impl Into<String>, op: FilterOp, values: Vec<String>) -> Self {
        Self {
            property: property.into(),
            op,
            values,
        }
    }

    /// `property IN (values)`.
    #[must_use]
    pub fn is_in(property: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(property, FilterOp::In, values)
    }

    /// `property NOT IN (values)`.
    #[must_use]
    pub fn not_in(property: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(property, FilterOp::NotIn, values)
    }

    #[inline]
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[inline]
    #[must_use]
    pub fn op(&self) -> FilterOp {
        self.op
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns `true` if the filter can never match any row.
    ///
    /// Only an `In` / `AclGrants` filter with no values is unsatisfiable.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self.op, FilterOp::In | FilterOp::AclGrants) && self.values.is_empty()
    }
}

/// A conjunction (AND) of scope filters: one access path.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScopeConstraint {
    filters: Vec<ScopeFilter>,
}

impl ScopeConstraint {
    #[must_use]
    pub fn new(filters: Vec<ScopeFilter>) -> Self {
        Self { filters }
    }

    /// Append a filter to this access path.
    #[must_use]
    pub fn and(mut self, filter: ScopeFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[inline]
    #[must_use]
    pub fn filters(&self) -> &[ScopeFilter] {
        &self.filters
    }

    /// Returns `true` if this constraint has no filters (matches every row).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// The (resource type, action) pair an ACL filter is evaluated against.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AclRequirement {
    pub resource_type: String,
    pub action: String,
}

impl AclRequirement {
    #[must_use]
    pub fn new(resource_type: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            action: action.into(),
        }
    }

    /// Returns `true` if an ACL entry with these patterns applies to the requirement.
    #[must_use]
    pub fn is_matched_by(&self, resource_type: &str, action: &str) -> bool {
        pattern_matches(resource_type, &self.resource_type) && pattern_matches(action, &self.action)
    }
}

/// A disjunction (OR) of scope constraints defining what rows are accessible.
///
/// Each constraint is an independent access path. Filters within a
/// constraint are AND-ed. An unconstrained scope bypasses row-level
/// filtering; the default scope denies everything.
///
/// # Examples
///
/// ```
/// use authz_scope::{AccessScope, properties};
///
/// let scope = AccessScope::deny_all();
/// assert!(scope.is_deny_all());
///
/// let scope = AccessScope::for_orgs(vec!["org-a".to_owned()]);
/// assert!(scope.contains_value(properties::ORG_ID, "org-a"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessScope {
    constraints: Vec<ScopeConstraint>,
    unconstrained: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    acl: Option<AclRequirement>,
}

impl Default for AccessScope {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl AccessScope {
    // ── Constructors ────────────────────────────────────────────────

    /// Build a scope from OR-ed constraints. Unsatisfiable constraints are dropped.
    #[must_use]
    pub fn from_constraints(constraints: Vec<ScopeConstraint>) -> Self {
        let constraints = constraints
            .into_iter()
            .filter(|c| !c.filters().iter().any(ScopeFilter::is_unsatisfiable))
            .collect();
        Self {
            constraints,
            unconstrained: false,
            acl: None,
        }
    }

    #[must_use]
    pub fn single(constraint: ScopeConstraint) -> Self {
        Self::from_constraints(vec![constraint])
    }

    /// Unconstrained scope: no row-level filtering.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            constraints: Vec::new(),
            unconstrained: true,
            acl: None,
        }
    }

    /// Scope that matches no rows.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            constraints: Vec::new(),
            unconstrained: false,
            acl: None,
        }
    }

    /// Scope restricted to rows owned by any of the given organizations.
    #[must_use]
    pub fn for_orgs(ids: Vec<String>) -> Self {
        Self::single(ScopeConstraint::new(vec![ScopeFilter::is_in(
            properties::ORG_ID,
            ids,
        )]))
    }

    /// Attach the (type, action) pair that ACL filters are checked against.
    #[must_use]
    pub fn with_acl_requirement(mut self, requirement: AclRequirement) -> Self {
        self.acl = Some(requirement);
        self
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The constraints in this scope (OR-ed).
    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &[ScopeConstraint] {
        &self.constraints
    }

    #[inline]
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.unconstrained
    }

    /// A scope is deny-all when it is not unconstrained and has no constraints.
    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        !self.unconstrained && self.constraints.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn acl_requirement(&self) -> Option<&AclRequirement> {
        self.acl.as_ref()
    }

    /// Returns `true` if storage must consult per-row ACLs to apply this scope.
    #[must_use]
    pub fn requires_acl_check(&self) -> bool {
        self.constraints.iter().any(|c| {
            c.filters()
                .iter()
                .any(|f| matches!(f.op(), FilterOp::AclGrants | FilterOp::AclNoDeny))
        })
    }

    /// Collect all `In` values for a property across all constraints.
    #[must_use]
    pub fn all_values_for(&self, property: &str) -> Vec<&str> {
        let mut result = Vec::new();
        for constraint in &self.constraints {
            for filter in constraint.filters() {
                if filter.property() == property && filter.op() == FilterOp::In {
                    result.extend(filter.values().iter().map(String::as_str));
                }
            }
        }
        result
    }

    /// Check if any constraint has an `In` filter containing the value.
    #[must_use]
    pub fn contains_value(&self, property: &str, value: &str) -> bool {
        self.constraints.iter().any(|c| {
            c.filters().iter().any(|f| {
                f.property() == property
                    && f.op() == FilterOp::In
                    && f.values().iter().any(|v| v == value)
            })
        })
    }

    #[must_use]
    pub fn has_property(&self, property: &str) -> bool {
        self.constraints
            .iter()
            .any(|c| c.filters().iter().any(|f| f.property() == property))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_is_deny_all() {
        let scope = AccessScope::default();
        assert!(scope.is_deny_all());
        assert!(!scope.is_unconstrained());
    }

    #[test]
    fn allow_all_is_not_deny_all() {
        let scope = AccessScope::allow_all();
        assert!(scope.is_unconstrained());
        assert!(!scope.is_deny_all());
    }

    #[test]
    fn unsatisfiable_constraints_are_dropped() {
        let scope = AccessScope::from_constraints(vec![
            ScopeConstraint::new(vec![ScopeFilter::is_in(properties::ORG_ID, vec![])]),
            ScopeConstraint::new(vec![ScopeFilter::not_in(properties::ORG_ID, vec![])]),
        ]);
        assert_eq!(scope.constraints().len(), 1);
        assert!(!scope.is_deny_all());
    }

    #[test]
    fn empty_org_list_is_deny_all() {
        assert!(AccessScope::for_orgs(vec![]).is_deny_all());
    }

    #[test]
    fn contains_value_ignores_not_in() {
        let scope = AccessScope::single(
            ScopeConstraint::default()
                .and(ScopeFilter::not_in(properties::ORG_ID, vec!["a".to_owned()]))
                .and(ScopeFilter::is_in(properties::OWNER_ID, vec!["u".to_owned()])),
        );
        assert!(!scope.contains_value(properties::ORG_ID, "a"));
        assert!(scope.contains_value(properties::OWNER_ID, "u"));
        assert!(scope.has_property(properties::ORG_ID));
        assert_eq!(scope.all_values_for(properties::OWNER_ID), vec!["u"]);
    }

    #[test]
    fn acl_requirement_uses_wildcards() {
        let req = AclRequirement::new("workspace", "read");
        assert!(req.is_matched_by("workspace", "read"));
        assert!(req.is_matched_by(WILDCARD, "read"));
        assert!(req.is_matched_by("workspace", WILDCARD));
        assert!(!req.is_matched_by("template", "read"));
        assert!(!req.is_matched_by("workspace", "update"));
    }

    #[test]
    fn requires_acl_check_detects_acl_filters() {
        let plain = AccessScope::for_orgs(vec!["a".to_owned()]);
        assert!(!plain.requires_acl_check());

        let acl = AccessScope::single(ScopeConstraint::new(vec![ScopeFilter::new(
            properties::ACL,
            FilterOp::AclGrants,
            vec![acl_user_key("u1")],
        )]));
        assert!(acl.requires_acl_check());
    }

    #[test]
    fn serializes_without_acl_when_absent() {
        let json = serde_json::to_value(AccessScope::allow_all()).unwrap();
        assert!(json.get("acl").is_none());
        assert_eq!(json["unconstrained"], serde_json::json!(true));
    }
}
