use super::{EffectedSubjects, Enforcer, SubjectClassification};
use crate::error::Result;
use crate::index::{PermissionIndex, PolicyTree, PolicyTrie};
use crate::json_view;
use crate::policy::PolicySnapshot;
use crate::resolution;
use crate::types::{AuthorizationContext, JsonPointer, Permissions, ResourceKey, SubjectId};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Throughput-optimized enforcer: every node and subtree union precomputed.
pub type TrieBasedEnforcer = IndexedEnforcer<PolicyTrie>;

/// Memory-optimized enforcer: sorted rules, node data derived per query.
pub type TreeBasedEnforcer = IndexedEnforcer<PolicyTree>;

/// An [`Enforcer`] answering every query from one permission index.
#[derive(Debug)]
pub struct IndexedEnforcer<I> {
    policy_id: Option<String>,
    revision: Option<u64>,
    index: I,
}

impl<I> IndexedEnforcer<I> {
    fn with_index(snapshot: &PolicySnapshot, index: I) -> Self {
        Self {
            policy_id: snapshot.policy_id().map(str::to_string),
            revision: snapshot.revision(),
            index,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }
}

impl IndexedEnforcer<PolicyTrie> {
    pub fn new(snapshot: &PolicySnapshot) -> Self {
        Self::with_index(snapshot, PolicyTrie::from_snapshot(snapshot))
    }
}

impl IndexedEnforcer<PolicyTree> {
    pub fn new(snapshot: &PolicySnapshot) -> Self {
        Self::with_index(snapshot, PolicyTree::from_snapshot(snapshot))
    }
}

impl<I: PermissionIndex + Debug> Enforcer for IndexedEnforcer<I> {
    fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }

    fn revision(&self) -> Option<u64> {
        self.revision
    }

    fn has_unrestricted_permissions(
        &self,
        resource: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<bool> {
        resolution::has_unrestricted_permissions(&self.index, resource, context, permissions)
    }

    fn has_partial_permissions(
        &self,
        resource: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<bool> {
        resolution::has_partial_permissions(&self.index, resource, context, permissions)
    }

    fn subjects_with_permission(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<EffectedSubjects> {
        resolution::subjects_with_permission(&self.index, resource, permissions)
    }

    fn subjects_with_partial_permission(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<BTreeSet<SubjectId>> {
        resolution::subjects_with_partial_permission(&self.index, resource, permissions)
    }

    fn subjects_with_unrestricted_permission(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<BTreeSet<SubjectId>> {
        resolution::subjects_with_unrestricted_permission(&self.index, resource, permissions)
    }

    fn classify_subjects(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<SubjectClassification> {
        resolution::classify_subjects(&self.index, resource, permissions)
    }

    fn build_json_view_with_allowlist(
        &self,
        resource: &ResourceKey,
        document: &Value,
        context: &AuthorizationContext,
        allowlist: &[JsonPointer],
        permissions: &Permissions,
    ) -> Result<Value> {
        json_view::build_view(&self.index, resource, document, context, allowlist, permissions)
    }

    fn accessible_paths(
        &self,
        resource: &ResourceKey,
        document: &Value,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<BTreeSet<ResourceKey>> {
        json_view::accessible_paths(&self.index, resource, document, context, permissions)
    }
}
