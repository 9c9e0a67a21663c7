use super::{IndexCursor, NodePermissions, PermissionIndex};
use crate::policy::PolicySnapshot;
use crate::types::{ResourceKey, ResourceType, SubjectId};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<String, usize>,
    permissions: NodePermissions,
    /// Union of `permissions` over every descendant.
    below: NodePermissions,
}

/// Path trie with every node and subtree union materialized at build time.
///
/// Nodes live in one arena and refer to their children by index. A child is
/// always pushed after its parent, which lets the subtree unions be computed
/// in a single reverse sweep. After [`PolicyTrie::from_snapshot`] returns the
/// trie is never modified.
#[derive(Debug, Default)]
pub struct PolicyTrie {
    roots: BTreeMap<ResourceType, usize>,
    nodes: Vec<TrieNode>,
}

impl PolicyTrie {
    pub fn from_snapshot(snapshot: &PolicySnapshot) -> Self {
        let started = Instant::now();
        let mut trie = Self::default();

        for entry in snapshot.entries() {
            let subjects: Vec<&SubjectId> = entry.subjects().keys().collect();
            for (resource, effected) in entry.resources() {
                let index = trie.insert(resource);
                let node = &mut trie.nodes[index].permissions;
                for permission in effected.grant.iter() {
                    node.add_grants(permission, subjects.iter().copied());
                }
                for permission in effected.revoke.iter() {
                    node.add_revokes(permission, subjects.iter().copied());
                }
            }
        }
        trie.aggregate_subtrees();

        debug!(
            "Built policy trie: policy={:?}, revision={:?}, nodes={}, elapsed={:?}",
            snapshot.policy_id(),
            snapshot.revision(),
            trie.nodes.len(),
            started.elapsed()
        );
        trie
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn insert(&mut self, resource: &ResourceKey) -> usize {
        let mut current = match self.roots.get(&resource.resource_type()) {
            Some(&root) => root,
            None => {
                let root = self.push_node();
                self.roots.insert(resource.resource_type(), root);
                root
            }
        };
        for segment in resource.path().segments() {
            current = match self.nodes[current].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = self.push_node();
                    self.nodes[current].children.insert(segment.clone(), child);
                    child
                }
            };
        }
        current
    }

    fn push_node(&mut self) -> usize {
        self.nodes.push(TrieNode::default());
        self.nodes.len() - 1
    }

    fn aggregate_subtrees(&mut self) {
        for index in (0..self.nodes.len()).rev() {
            let mut below = NodePermissions::default();
            for &child in self.nodes[index].children.values() {
                below.merge(&self.nodes[child].permissions);
                below.merge(&self.nodes[child].below);
            }
            self.nodes[index].below = below;
        }
    }
}

/// Cursor over a [`PolicyTrie`]; every call is a direct arena lookup.
#[derive(Debug, Clone, Copy)]
pub struct TrieCursor<'a> {
    trie: &'a PolicyTrie,
    node: usize,
}

impl<'a> IndexCursor<'a> for TrieCursor<'a> {
    fn permissions(&self) -> Cow<'a, NodePermissions> {
        let trie = self.trie;
        Cow::Borrowed(&trie.nodes[self.node].permissions)
    }

    fn below(&self) -> Cow<'a, NodePermissions> {
        let trie = self.trie;
        Cow::Borrowed(&trie.nodes[self.node].below)
    }

    fn child(&self, segment: &str) -> Option<Self> {
        self.trie.nodes[self.node]
            .children
            .get(segment)
            .map(|&node| TrieCursor {
                trie: self.trie,
                node,
            })
    }

    fn children(&self) -> Vec<Self> {
        self.trie.nodes[self.node]
            .children
            .values()
            .map(|&node| TrieCursor {
                trie: self.trie,
                node,
            })
            .collect()
    }
}

impl PermissionIndex for PolicyTrie {
    type Cursor<'a> = TrieCursor<'a>;

    fn root(&self, resource_type: ResourceType) -> Option<TrieCursor<'_>> {
        self.roots
            .get(&resource_type)
            .map(|&node| TrieCursor { trie: self, node })
    }
}
