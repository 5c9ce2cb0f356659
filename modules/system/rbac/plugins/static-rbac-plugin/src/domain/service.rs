//! Service implementation for the static rbac plugin.

use std::collections::BTreeSet;

use rbac_sdk::{Action, Ceiling, EvaluatorError, Predicate, Value};

use super::input::{FullInput, Outcome, PartialInput, RoleView, Target, acl_permissions};
use crate::config::{EvaluationMode, StaticRbacPluginConfig};

/// Static rbac rule evaluator.
///
/// In `enforce` mode a request is allowed when:
/// - the scope allow-list is empty or contains the object ID
/// - the subject's roles or the object ACLs grant the action
/// - the scope role independently grants it (site, org or user level)
/// - no applicable entry from either authority negates it
///
/// In `deny_all` mode every request is denied.
pub struct Service {
    mode: EvaluationMode,
}

impl Default for Service {
    fn default() -> Self {
        Self::from_config(&StaticRbacPluginConfig::default())
    }
}

impl Service {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(cfg: &StaticRbacPluginConfig) -> Self {
        tracing::info!(vendor = %cfg.vendor, mode = ?cfg.mode, "static rbac plugin configured");
        Self { mode: cfg.mode }
    }

    /// Decide a full `{subject, action, object}` input.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if the input does not have the expected shape.
    pub fn evaluate(&self, input: &Value) -> Result<bool, EvaluatorError> {
        let input = FullInput::parse(input)?;
        if self.mode == EvaluationMode::DenyAll {
            return Ok(false);
        }

        let subject = &input.subject;
        let object = &input.object;
        let target = Target {
            resource_type: object.resource_type,
            action: input.action,
        };

        if !subject.allow_list.is_empty() && !subject.allow_list.iter().any(|id| id == object.id) {
            tracing::debug!(object_id = object.id, "object outside scope allow-list");
            return Ok(false);
        }

        let owned = !object.owner.is_empty() && object.owner == subject.id;

        let mut authority = Outcome::default();
        for role in &subject.roles {
            authority.merge(role_outcome(role, target, object.org_owner, owned)?);
        }
        authority.absorb(acl_permissions(object.acl_user_list, subject.id)?, target)?;
        for group in &subject.groups {
            authority.absorb(acl_permissions(object.acl_group_list, group)?, target)?;
        }

        let scope = role_outcome(&subject.scope_role, target, object.org_owner, owned)?;

        let allowed = !authority.denied && !scope.denied && authority.granted && scope.granted;
        tracing::debug!(
            subject_id = subject.id,
            action = input.action,
            resource_type = object.resource_type,
            ?authority,
            ?scope,
            allowed,
            "evaluated rbac request"
        );
        Ok(allowed)
    }

    /// Derive a predicate from a partial `{subject, action, object: {type}}` input.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if the input does not have the expected shape.
    pub fn partial(&self, input: &Value) -> Result<Predicate, EvaluatorError> {
        let input = PartialInput::parse(input)?;
        let subject = &input.subject;
        let action = Action::new(input.action.to_owned());
        if self.mode == EvaluationMode::DenyAll {
            return Ok(Predicate::deny_all(input.resource_type, action, subject.id));
        }

        let target = Target {
            resource_type: input.resource_type,
            action: input.action,
        };

        let mut authority = LevelSummary::default();
        for role in &subject.roles {
            authority.absorb(role, target)?;
        }
        let mut scope = LevelSummary::default();
        scope.absorb(&subject.scope_role, target)?;

        let any_blanket_deny = authority.site.denied || scope.site.denied;
        let deny_orgs: BTreeSet<String> = authority
            .org_denies
            .union(&scope.org_denies)
            .cloned()
            .collect();
        let deny_own = authority.user.denied || scope.user.denied;

        let predicate = Predicate {
            resource_type: input.resource_type.to_owned(),
            action,
            subject_id: subject.id.to_owned(),
            groups: subject.groups.clone(),
            allow_site: authority.site.granted && !any_blanket_deny,
            allow_orgs: authority
                .org_grants
                .difference(&deny_orgs)
                .cloned()
                .collect(),
            allow_own: authority.user.granted && !deny_own,
            allow_ids: (!subject.allow_list.is_empty())
                .then(|| subject.allow_list.iter().cloned().collect()),
            any_blanket_deny,
            deny_orgs,
            deny_own,
            ceiling: Ceiling {
                site: scope.site.granted,
                orgs: scope.org_grants,
                own: scope.user.granted,
            },
        };
        tracing::debug!(
            subject_id = subject.id,
            action = input.action,
            resource_type = input.resource_type,
            deny_all = predicate.is_deny_all(),
            acl_only = predicate.acl_only(),
            "derived rbac predicate"
        );
        Ok(predicate)
    }
}

/// Permissions of a role applicable to one concrete object.
fn role_outcome(
    role: &RoleView<'_>,
    target: Target<'_>,
    org_id: &str,
    owned: bool,
) -> Result<Outcome, EvaluatorError> {
    let mut outcome = Outcome::of(role.site, target)?;
    if !org_id.is_empty() {
        outcome.absorb(role.org_permissions(org_id)?, target)?;
    }
    if owned {
        outcome.absorb(role.user, target)?;
    }
    Ok(outcome)
}

/// Per-level grants and denies of a set of roles, independent of any object.
#[derive(Debug, Default)]
struct LevelSummary {
    site: Outcome,
    org_grants: BTreeSet<String>,
    org_denies: BTreeSet<String>,
    user: Outcome,
}

impl LevelSummary {
    fn absorb(&mut self, role: &RoleView<'_>, target: Target<'_>) -> Result<(), EvaluatorError> {
        self.site.absorb(role.site, target)?;
        self.user.absorb(role.user, target)?;
        for org_id in role.org.keys() {
            let outcome = Outcome::of(role.org_permissions(org_id)?, target)?;
            if outcome.granted {
                self.org_grants.insert(org_id.clone());
            }
            if outcome.denied {
                self.org_denies.insert(org_id.clone());
            }
        }
        Ok(())
    }
}
