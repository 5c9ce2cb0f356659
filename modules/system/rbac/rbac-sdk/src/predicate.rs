//! Partial-evaluation result for a fixed `(subject, action, resource type)`.
//!
//! A [`Predicate`] describes which objects of one resource type the subject
//! may act on, in terms of object attributes only. [`Predicate::matches`]
//! agrees with a full decision for every object of that type; the PEP
//! compiler turns it into an `AccessScope` for storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{Action, Object, Permission};

/// Authority granted by the subject's scope role, which caps everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ceiling {
    pub site: bool,
    pub orgs: BTreeSet<String>,
    pub own: bool,
}

impl Ceiling {
    /// The scope grants nothing for this resource type and action.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.site && self.orgs.is_empty() && !self.own
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Predicate {
    pub resource_type: String,
    pub action: Action,
    pub subject_id: String,
    /// ACL principals besides the subject itself.
    pub groups: Vec<String>,

    /// A site-level grant applies and no site-level negate does.
    pub allow_site: bool,
    /// Orgs with an org-level grant and no negate from either authority.
    pub allow_orgs: BTreeSet<String>,
    /// User-level grant on owned objects, not negated.
    pub allow_own: bool,
    /// Scope allow-list. `None` means unrestricted.
    pub allow_ids: Option<BTreeSet<String>>,
    /// A site-level negate applies; nothing is allowed.
    pub any_blanket_deny: bool,
    /// Orgs where an org-level negate applies.
    pub deny_orgs: BTreeSet<String>,
    /// A user-level negate applies to owned objects.
    pub deny_own: bool,

    pub ceiling: Ceiling,
}

impl Predicate {
    /// A predicate that matches nothing.
    #[must_use]
    pub fn deny_all(
        resource_type: impl Into<String>,
        action: Action,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            action,
            subject_id: subject_id.into(),
            groups: Vec::new(),
            allow_site: false,
            allow_orgs: BTreeSet::new(),
            allow_own: false,
            allow_ids: None,
            any_blanket_deny: true,
            deny_orgs: BTreeSet::new(),
            deny_own: false,
            ceiling: Ceiling::default(),
        }
    }

    /// Returns `true` if no object can match.
    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        self.any_blanket_deny
            || self.ceiling.is_empty()
            || self.allow_ids.as_ref().is_some_and(BTreeSet::is_empty)
    }

    /// Returns `true` if the coarse grants cannot allow anything, so only
    /// per-object ACL grants can.
    #[must_use]
    pub fn acl_only(&self) -> bool {
        !self.allow_site && self.allow_orgs.is_empty() && !self.allow_own
    }

    /// Evaluate the predicate against a concrete object.
    #[must_use]
    pub fn matches(&self, object: &Object) -> bool {
        if object.resource_type != self.resource_type || self.any_blanket_deny {
            return false;
        }
        if let Some(ids) = &self.allow_ids
            && !ids.contains(&object.id)
        {
            return false;
        }

        let owned = object.is_owned_by(&self.subject_id);
        let in_org = |set: &BTreeSet<String>| !object.org_id.is_empty() && set.contains(&object.org_id);

        if in_org(&self.deny_orgs) || (owned && self.deny_own) {
            return false;
        }

        let (acl_granted, acl_denied) = self.acl_outcome(object);
        if acl_denied {
            return false;
        }

        let subject_grants =
            self.allow_site || in_org(&self.allow_orgs) || (owned && self.allow_own) || acl_granted;
        let scope_grants =
            self.ceiling.site || in_org(&self.ceiling.orgs) || (owned && self.ceiling.own);

        subject_grants && scope_grants
    }

    /// Scan the object ACL for the subject and its groups: `(any grant, any deny)`.
    fn acl_outcome(&self, object: &Object) -> (bool, bool) {
        let user_entries = object.acl_user_list.get(&self.subject_id).into_iter();
        let group_entries = self
            .groups
            .iter()
            .filter_map(|g| object.acl_group_list.get(g));

        let mut granted = false;
        let mut denied = false;
        for permission in user_entries.chain(group_entries).flatten() {
            if !self.applies(permission) {
                continue;
            }
            if permission.negate {
                denied = true;
            } else {
                granted = true;
            }
        }
        (granted, denied)
    }

    fn applies(&self, permission: &Permission) -> bool {
        permission.applies_to(&self.resource_type, &self.action)
    }
}
