//! Permission resolution over any [`PermissionIndex`].
//!
//! Every query starts by locating the queried path: the explicit node
//! assignments from the namespace root down to the path (the ancestor chain)
//! and, when the path itself exists in the index, a cursor positioned on it
//! for subtree lookups.

use crate::enforcer::{EffectedSubjects, SubjectClassification};
use crate::error::Result;
use crate::index::{IndexCursor, NodePermissions, PermissionIndex};
use crate::types::{AuthorizationContext, JsonPointer, Permissions, ResourceKey, SubjectId};
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::trace;

/// Effective grant state of one (subject, permission) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Unset,
    Granted,
    Revoked,
}

impl Verdict {
    /// Applies one node on top of the verdict inherited from its ancestors.
    /// A node that mentions the pair overrides; revoke wins within the node.
    pub(crate) fn apply(
        self,
        node: &NodePermissions,
        permission: &str,
        subject: &SubjectId,
    ) -> Self {
        if node.is_revoked(permission, subject) {
            Verdict::Revoked
        } else if node.is_granted(permission, subject) {
            Verdict::Granted
        } else {
            self
        }
    }

    pub(crate) fn is_granted(self) -> bool {
        self == Verdict::Granted
    }
}

pub(crate) struct Located<'a, C> {
    /// Explicit assignments from the root to the deepest existing node on the path.
    pub(crate) chain: Vec<Cow<'a, NodePermissions>>,
    /// Cursor on the queried path, `None` when the index has no node there.
    pub(crate) target: Option<C>,
}

impl<'a, C: IndexCursor<'a>> Located<'a, C> {
    pub(crate) fn effective(&self, permission: &str, subject: &SubjectId) -> Verdict {
        self.chain
            .iter()
            .fold(Verdict::Unset, |verdict, node| verdict.apply(node, permission, subject))
    }

    fn below(&self) -> Option<Cow<'a, NodePermissions>> {
        self.target.as_ref().map(|cursor| cursor.below())
    }

    fn at_target(&self) -> Option<Cow<'a, NodePermissions>> {
        self.target.as_ref().map(|cursor| cursor.permissions())
    }
}

pub(crate) fn locate<'a, C: IndexCursor<'a>>(
    root: Option<C>,
    path: &JsonPointer,
) -> Located<'a, C> {
    let mut chain = Vec::with_capacity(path.len() + 1);
    let Some(mut cursor) = root else {
        return Located { chain, target: None };
    };
    chain.push(cursor.permissions());
    for segment in path.segments() {
        match cursor.child(segment) {
            Some(child) => {
                chain.push(child.permissions());
                cursor = child;
            }
            None => return Located { chain, target: None },
        }
    }
    Located {
        chain,
        target: Some(cursor),
    }
}

pub(crate) fn locate_key<'a, I: PermissionIndex>(
    index: &'a I,
    key: &ResourceKey,
) -> Located<'a, I::Cursor<'a>> {
    locate(index.root(key.resource_type()), key.path())
}

fn is_unrestricted<'a, C: IndexCursor<'a>>(
    located: &Located<'a, C>,
    below: Option<&NodePermissions>,
    permission: &str,
    subject: &SubjectId,
) -> bool {
    located.effective(permission, subject).is_granted()
        && !below.is_some_and(|b| b.is_revoked(permission, subject))
}

/// Subjects granted every permission at some single node at or below the
/// located path, counting grants inherited from that node's ancestors.
/// Revokes are not consulted.
fn partial_subjects<'a, C: IndexCursor<'a>>(
    located: &Located<'a, C>,
    permissions: &Permissions,
) -> BTreeSet<SubjectId> {
    let mut inherited = NodePermissions::default();
    for node in &located.chain {
        inherited.merge_grants(node);
    }
    let mut partial = granted_all(&inherited, permissions);
    if let Some(target) = &located.target {
        for child in target.children() {
            collect_partial(child, &inherited, permissions, &mut partial);
        }
    }
    partial
}

fn collect_partial<'a, C: IndexCursor<'a>>(
    cursor: C,
    inherited: &NodePermissions,
    permissions: &Permissions,
    partial: &mut BTreeSet<SubjectId>,
) {
    let mut here = inherited.clone();
    here.merge_grants(&cursor.permissions());
    partial.extend(granted_all(&here, permissions));
    for child in cursor.children() {
        collect_partial(child, &here, permissions, partial);
    }
}

/// Subjects granted every one of `permissions` at `node`.
fn granted_all(node: &NodePermissions, permissions: &Permissions) -> BTreeSet<SubjectId> {
    let mut granted: Option<BTreeSet<SubjectId>> = None;
    for permission in permissions.iter() {
        let here = node.granted(permission).cloned().unwrap_or_default();
        granted = Some(match granted {
            None => here,
            Some(so_far) => so_far.intersection(&here).cloned().collect(),
        });
    }
    granted.unwrap_or_default()
}

pub(crate) fn has_unrestricted_permissions<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> Result<bool> {
    permissions.ensure_not_empty()?;
    let located = locate_key(index, key);
    let below = located.below();
    let allowed = permissions.iter().all(|permission| {
        context
            .subjects()
            .iter()
            .any(|subject| is_unrestricted(&located, below.as_deref(), permission, subject))
    });
    trace!("Unrestricted {} on {}: {}", permissions, key, allowed);
    Ok(allowed)
}

pub(crate) fn has_partial_permissions<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> Result<bool> {
    permissions.ensure_not_empty()?;
    let located = locate_key(index, key);
    let partial = partial_subjects(&located, permissions);
    let allowed = context
        .subjects()
        .iter()
        .any(|subject| partial.contains(subject));
    trace!("Partial {} on {}: {}", permissions, key, allowed);
    Ok(allowed)
}

pub(crate) fn subjects_with_permission<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    permissions: &Permissions,
) -> Result<EffectedSubjects> {
    permissions.ensure_not_empty()?;
    let located = locate_key(index, key);
    let effected = match located.at_target() {
        Some(node) => exact_node_subjects(&node, permissions),
        None => EffectedSubjects::default(),
    };
    Ok(effected)
}

fn exact_node_subjects(node: &NodePermissions, permissions: &Permissions) -> EffectedSubjects {
    let mut revoked = BTreeSet::new();
    for permission in permissions.iter() {
        if let Some(subjects) = node.revoked(permission) {
            revoked.extend(subjects.iter().cloned());
        }
    }
    EffectedSubjects::new(granted_all(node, permissions), revoked)
}

pub(crate) fn subjects_with_partial_permission<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    permissions: &Permissions,
) -> Result<BTreeSet<SubjectId>> {
    Ok(classify_subjects(index, key, permissions)?.partial())
}

pub(crate) fn subjects_with_unrestricted_permission<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    permissions: &Permissions,
) -> Result<BTreeSet<SubjectId>> {
    Ok(classify_subjects(index, key, permissions)?.unrestricted().clone())
}

/// Computes all three subject sets from a single locate.
pub(crate) fn classify_subjects<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    permissions: &Permissions,
) -> Result<SubjectClassification> {
    permissions.ensure_not_empty()?;
    let located = locate_key(index, key);
    let below = located.below();
    let below = below.as_deref();

    // Every unrestricted subject is also partial: at `key` itself it holds
    // an effective, hence explicit, grant for each permission.
    let mut unrestricted = BTreeSet::new();
    let mut partial_only = BTreeSet::new();
    for subject in partial_subjects(&located, permissions) {
        if permissions
            .iter()
            .all(|permission| is_unrestricted(&located, below, permission, &subject))
        {
            unrestricted.insert(subject);
        } else {
            partial_only.insert(subject);
        }
    }

    let effected_granted = match located.at_target() {
        Some(node) => exact_node_subjects(&node, permissions).granted().clone(),
        None => BTreeSet::new(),
    };

    trace!(
        "Classified subjects for {} on {}: unrestricted={}, partial_only={}, effected_granted={}",
        permissions,
        key,
        unrestricted.len(),
        partial_only.len(),
        effected_granted.len()
    );
    Ok(SubjectClassification::new(unrestricted, partial_only, effected_granted))
}
