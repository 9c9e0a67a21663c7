//! Resource permission indices.
//!
//! An index answers "which subjects are explicitly granted or revoked
//! permission P at path X" without re-reading the policy entries. Both
//! implementations expose the same cursor interface: start at the root of a
//! resource namespace, descend one segment at a time, and at each node read
//! the explicit assignments there or the union of everything below.
//!
//! - [`PolicyTrie`] materializes every node and its subtree union up front.
//! - [`PolicyTree`] keeps one sorted rule per (entry, resource) and derives
//!   node data on demand.

mod tree;
mod trie;

pub use tree::{PolicyTree, TreeCursor};
pub use trie::{PolicyTrie, TrieCursor};

use crate::types::{ResourceType, SubjectId};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Subjects explicitly granted and revoked one permission at one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantRevoke {
    pub granted: BTreeSet<SubjectId>,
    pub revoked: BTreeSet<SubjectId>,
}

/// Explicit grant/revoke assignments at one node, per permission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePermissions {
    by_permission: BTreeMap<String, GrantRevoke>,
}

impl NodePermissions {
    pub fn granted(&self, permission: &str) -> Option<&BTreeSet<SubjectId>> {
        self.by_permission.get(permission).map(|gr| &gr.granted)
    }

    pub fn revoked(&self, permission: &str) -> Option<&BTreeSet<SubjectId>> {
        self.by_permission.get(permission).map(|gr| &gr.revoked)
    }

    pub fn is_granted(&self, permission: &str, subject: &SubjectId) -> bool {
        self.granted(permission).is_some_and(|s| s.contains(subject))
    }

    pub fn is_revoked(&self, permission: &str, subject: &SubjectId) -> bool {
        self.revoked(permission).is_some_and(|s| s.contains(subject))
    }

    /// Every subject granted any permission here.
    pub fn granted_subjects(&self) -> impl Iterator<Item = &SubjectId> {
        self.by_permission.values().flat_map(|gr| gr.granted.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.by_permission.is_empty()
    }

    pub(crate) fn add_grants<'s>(
        &mut self,
        permission: &str,
        subjects: impl IntoIterator<Item = &'s SubjectId>,
    ) {
        self.slot(permission).granted.extend(subjects.into_iter().cloned());
    }

    pub(crate) fn add_revokes<'s>(
        &mut self,
        permission: &str,
        subjects: impl IntoIterator<Item = &'s SubjectId>,
    ) {
        self.slot(permission).revoked.extend(subjects.into_iter().cloned());
    }

    /// Unions `other` into this node.
    pub(crate) fn merge(&mut self, other: &NodePermissions) {
        for (permission, gr) in &other.by_permission {
            let slot = self.slot(permission);
            slot.granted.extend(gr.granted.iter().cloned());
            slot.revoked.extend(gr.revoked.iter().cloned());
        }
    }

    /// Unions only the grants of `other` into this node.
    pub(crate) fn merge_grants(&mut self, other: &NodePermissions) {
        for (permission, gr) in &other.by_permission {
            if !gr.granted.is_empty() {
                self.slot(permission).granted.extend(gr.granted.iter().cloned());
            }
        }
    }

    fn slot(&mut self, permission: &str) -> &mut GrantRevoke {
        self.by_permission
            .entry(permission.to_string())
            .or_default()
    }
}

/// A position inside an index, bound to the index lifetime `'a`.
pub trait IndexCursor<'a>: Sized {
    /// The assignments made explicitly at this node.
    fn permissions(&self) -> Cow<'a, NodePermissions>;

    /// The union of the assignments of every node strictly below this one.
    fn below(&self) -> Cow<'a, NodePermissions>;

    /// Descends one segment. `None` when no entry mentions that path or
    /// anything beneath it.
    fn child(&self, segment: &str) -> Option<Self>;

    /// Every direct child, in segment order.
    fn children(&self) -> Vec<Self>;
}

/// A read-only lookup structure built once from a policy snapshot.
pub trait PermissionIndex: Send + Sync {
    type Cursor<'a>: IndexCursor<'a>
    where
        Self: 'a;

    /// The root of a resource namespace, or `None` when no entry mentions
    /// that namespace at all.
    fn root(&self, resource_type: ResourceType) -> Option<Self::Cursor<'_>>;
}
