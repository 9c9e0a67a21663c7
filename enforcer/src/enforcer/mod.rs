//! The query surface shared by both enforcer strategies.

mod indexed;

pub use indexed::{IndexedEnforcer, TreeBasedEnforcer, TrieBasedEnforcer};

use crate::error::Result;
use crate::types::{AuthorizationContext, JsonPointer, Permissions, ResourceKey, SubjectId};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Subjects explicitly granted or revoked permissions at one exact resource.
///
/// The two sets are not guaranteed to be disjoint: a subject granted and
/// revoked at the same node appears in both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectedSubjects {
    granted: BTreeSet<SubjectId>,
    revoked: BTreeSet<SubjectId>,
}

impl EffectedSubjects {
    pub(crate) fn new(granted: BTreeSet<SubjectId>, revoked: BTreeSet<SubjectId>) -> Self {
        Self { granted, revoked }
    }

    /// Subjects granted every requested permission at the resource.
    pub fn granted(&self) -> &BTreeSet<SubjectId> {
        &self.granted
    }

    /// Subjects revoked any requested permission at the resource.
    pub fn revoked(&self) -> &BTreeSet<SubjectId> {
        &self.revoked
    }
}

/// Subjects with access on a resource, split by how much of it they may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectClassification {
    unrestricted: BTreeSet<SubjectId>,
    partial_only: BTreeSet<SubjectId>,
    effected_granted: BTreeSet<SubjectId>,
}

impl SubjectClassification {
    pub(crate) fn new(
        unrestricted: BTreeSet<SubjectId>,
        partial_only: BTreeSet<SubjectId>,
        effected_granted: BTreeSet<SubjectId>,
    ) -> Self {
        Self {
            unrestricted,
            partial_only,
            effected_granted,
        }
    }

    /// Subjects granted the whole subtree with no revoke anywhere in it.
    pub fn unrestricted(&self) -> &BTreeSet<SubjectId> {
        &self.unrestricted
    }

    /// Subjects granted somewhere at or below the resource, minus the
    /// unrestricted ones.
    pub fn partial_only(&self) -> &BTreeSet<SubjectId> {
        &self.partial_only
    }

    /// Subjects explicitly granted at exactly this resource.
    pub fn effected_granted(&self) -> &BTreeSet<SubjectId> {
        &self.effected_granted
    }

    /// Every subject with partial permission, unrestricted ones included.
    pub fn partial(&self) -> BTreeSet<SubjectId> {
        self.unrestricted
            .union(&self.partial_only)
            .cloned()
            .collect()
    }
}

/// Answers access questions against one immutable policy revision.
///
/// Implementations are cheap to share: build once per revision, wrap in an
/// `Arc`, and query from any number of threads.
pub trait Enforcer: Send + Sync + Debug {
    fn policy_id(&self) -> Option<&str>;

    fn revision(&self) -> Option<u64>;

    /// Whether the context may access everything at and below `resource`.
    fn has_unrestricted_permissions(
        &self,
        resource: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<bool>;

    /// Whether the context may access anything at or below `resource`: one
    /// of its subjects holds every permission at a single node there, with
    /// grants inherited from ancestors. Revokes are ignored.
    fn has_partial_permissions(
        &self,
        resource: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<bool>;

    fn subjects_with_permission(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<EffectedSubjects>;

    fn subjects_with_partial_permission(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<BTreeSet<SubjectId>>;

    fn subjects_with_unrestricted_permission(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<BTreeSet<SubjectId>>;

    fn classify_subjects(
        &self,
        resource: &ResourceKey,
        permissions: &Permissions,
    ) -> Result<SubjectClassification>;

    /// The part of `document`, rooted at `resource`, the context may see.
    /// An empty object when nothing is visible.
    fn build_json_view(
        &self,
        resource: &ResourceKey,
        document: &Value,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<Value> {
        self.build_json_view_with_allowlist(resource, document, context, &[], permissions)
    }

    /// Like [`Enforcer::build_json_view`], additionally copying the
    /// `allowlist` fields unfiltered once the context has partial permission
    /// on `resource`.
    fn build_json_view_with_allowlist(
        &self,
        resource: &ResourceKey,
        document: &Value,
        context: &AuthorizationContext,
        allowlist: &[JsonPointer],
        permissions: &Permissions,
    ) -> Result<Value>;

    /// Full keys of every leaf of `document` the context may see.
    fn accessible_paths(
        &self,
        resource: &ResourceKey,
        document: &Value,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> Result<BTreeSet<ResourceKey>>;
}
