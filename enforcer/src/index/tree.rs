use super::{IndexCursor, NodePermissions, PermissionIndex};
use crate::policy::PolicySnapshot;
use crate::types::{JsonPointer, Permissions, ResourceType, SubjectId};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// One (entry, resource) assignment, kept close to the policy's own shape.
#[derive(Debug)]
struct ResourceRule {
    resource_type: ResourceType,
    path: JsonPointer,
    /// Shared by every rule of the same entry.
    subjects: Arc<[SubjectId]>,
    grant: Permissions,
    revoke: Permissions,
}

impl ResourceRule {
    fn segment(&self, depth: usize) -> &str {
        &self.path.segments()[depth]
    }

    fn apply_to(&self, node: &mut NodePermissions) {
        for permission in self.grant.iter() {
            node.add_grants(permission, self.subjects.iter());
        }
        for permission in self.revoke.iter() {
            node.add_revokes(permission, self.subjects.iter());
        }
    }
}

/// Flat list of policy rules sorted by `(resource type, path)`.
///
/// Nothing is precomputed beyond the sort: rules sharing a path prefix are
/// contiguous, so a cursor is just a slice, and node or subtree assignments
/// are merged from that slice when asked for.
#[derive(Debug, Default)]
pub struct PolicyTree {
    rules: Vec<ResourceRule>,
}

impl PolicyTree {
    pub fn from_snapshot(snapshot: &PolicySnapshot) -> Self {
        let started = Instant::now();
        let mut rules = Vec::new();

        for entry in snapshot.entries() {
            let subjects: Arc<[SubjectId]> = entry.subjects().keys().cloned().collect();
            for (resource, effected) in entry.resources() {
                rules.push(ResourceRule {
                    resource_type: resource.resource_type(),
                    path: resource.path().clone(),
                    subjects: Arc::clone(&subjects),
                    grant: effected.grant.clone(),
                    revoke: effected.revoke.clone(),
                });
            }
        }
        rules.sort_by(|a, b| {
            (a.resource_type, a.path.segments()).cmp(&(b.resource_type, b.path.segments()))
        });

        debug!(
            "Built policy tree: policy={:?}, revision={:?}, rules={}, elapsed={:?}",
            snapshot.policy_id(),
            snapshot.revision(),
            rules.len(),
            started.elapsed()
        );
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Cursor over a [`PolicyTree`]: the rules at or below one path, at `depth`.
#[derive(Debug, Clone, Copy)]
pub struct TreeCursor<'a> {
    depth: usize,
    /// Every rule here has at least `depth` segments and shares the cursor's
    /// path prefix; rules ending exactly at the cursor come first.
    rules: &'a [ResourceRule],
}

impl<'a> IndexCursor<'a> for TreeCursor<'a> {
    fn permissions(&self) -> Cow<'a, NodePermissions> {
        let mut node = NodePermissions::default();
        for rule in self.rules.iter().take_while(|r| r.path.len() == self.depth) {
            rule.apply_to(&mut node);
        }
        Cow::Owned(node)
    }

    fn below(&self) -> Cow<'a, NodePermissions> {
        let mut node = NodePermissions::default();
        for rule in self.rules.iter().skip_while(|r| r.path.len() == self.depth) {
            rule.apply_to(&mut node);
        }
        Cow::Owned(node)
    }

    fn child(&self, segment: &str) -> Option<Self> {
        let depth = self.depth;
        let rules = self.rules;
        let start =
            rules.partition_point(|r| r.path.len() == depth || r.segment(depth) < segment);
        let end =
            rules.partition_point(|r| r.path.len() == depth || r.segment(depth) <= segment);
        (start < end).then(|| TreeCursor {
            depth: depth + 1,
            rules: &rules[start..end],
        })
    }

    fn children(&self) -> Vec<Self> {
        let depth = self.depth;
        let mut rest = &self.rules[self.rules.partition_point(|r| r.path.len() == depth)..];
        let mut children = Vec::new();
        while let Some(first) = rest.first() {
            let segment = first.segment(depth);
            let end = rest.partition_point(|r| r.segment(depth) <= segment);
            children.push(TreeCursor {
                depth: depth + 1,
                rules: &rest[..end],
            });
            rest = &rest[end..];
        }
        children
    }
}

impl PermissionIndex for PolicyTree {
    type Cursor<'a> = TreeCursor<'a>;

    fn root(&self, resource_type: ResourceType) -> Option<TreeCursor<'_>> {
        let start = self.rules.partition_point(|r| r.resource_type < resource_type);
        let end = self.rules.partition_point(|r| r.resource_type <= resource_type);
        (start < end).then(|| TreeCursor {
            depth: 0,
            rules: &self.rules[start..end],
        })
    }
}
