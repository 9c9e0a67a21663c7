//! Filtering JSON documents down to what an authorization context may see.

use crate::error::Result;
use crate::index::{IndexCursor, NodePermissions, PermissionIndex};
use crate::resolution::{has_partial_permissions, locate_key, Located, Verdict};
use crate::types::{AuthorizationContext, JsonPointer, Permissions, ResourceKey, SubjectId};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::trace;

/// Walks a document alongside the index, carrying one verdict per
/// (subject, permission) pair, laid out subject-major.
struct ViewBuilder<'q> {
    subjects: &'q [SubjectId],
    permissions: Vec<&'q str>,
    allowlist: &'q [JsonPointer],
}

impl<'q> ViewBuilder<'q> {
    fn initial<'a, C: IndexCursor<'a>>(&self, located: &Located<'a, C>) -> Vec<Verdict> {
        self.pairs()
            .map(|(subject, permission)| located.effective(permission, subject))
            .collect()
    }

    fn pairs(&self) -> impl Iterator<Item = (&'q SubjectId, &'q str)> + '_ {
        self.subjects
            .iter()
            .flat_map(move |subject| self.permissions.iter().map(move |&p| (subject, p)))
    }

    fn descend(&self, node: &NodePermissions, verdicts: &[Verdict]) -> Vec<Verdict> {
        self.pairs()
            .zip(verdicts)
            .map(|((subject, permission), verdict)| verdict.apply(node, permission, subject))
            .collect()
    }

    /// Every permission is granted to at least one subject.
    fn is_visible(&self, verdicts: &[Verdict]) -> bool {
        let width = self.permissions.len();
        (0..width).all(|p| {
            verdicts
                .iter()
                .skip(p)
                .step_by(width)
                .any(|verdict| verdict.is_granted())
        })
    }

    fn is_allowlisted(&self, path: &JsonPointer) -> bool {
        self.allowlist.iter().any(|allowed| allowed == path)
    }

    fn allowlist_below(&self, path: &JsonPointer) -> bool {
        self.allowlist.iter().any(|allowed| allowed.starts_with(path))
    }

    fn visit<'a, C: IndexCursor<'a>>(
        &self,
        value: &Value,
        cursor: Option<&C>,
        verdicts: &[Verdict],
        path: &JsonPointer,
    ) -> Option<Value> {
        if self.is_allowlisted(path) {
            return Some(value.clone());
        }
        let fields = match value {
            Value::Object(fields) if !fields.is_empty() => fields,
            _ => return self.is_visible(verdicts).then(|| value.clone()),
        };

        let mut visible = Map::new();
        for (field, child) in fields {
            let child_path = path.child_field(field);
            let child_cursor = cursor.and_then(|c| c.child(field));
            let kept = match &child_cursor {
                Some(next) => {
                    let child_verdicts = self.descend(&next.permissions(), verdicts);
                    self.visit(child, Some(next), &child_verdicts, &child_path)
                }
                // Nothing in the index below: the current verdict covers the whole subtree.
                None if !self.allowlist_below(&child_path) => {
                    self.is_visible(verdicts).then(|| child.clone())
                }
                None => self.visit::<C>(child, None, verdicts, &child_path),
            };
            if let Some(kept) = kept {
                visible.insert(field.clone(), kept);
            }
        }
        (!visible.is_empty()).then_some(Value::Object(visible))
    }
}

/// Filters `document` rooted at `key`. `None` when nothing is visible.
fn filter<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    document: &Value,
    context: &AuthorizationContext,
    allowlist: &[JsonPointer],
    permissions: &Permissions,
) -> Result<Option<Value>> {
    permissions.ensure_not_empty()?;
    let relevant =
        !allowlist.is_empty() && has_partial_permissions(index, key, context, permissions)?;
    let builder = ViewBuilder {
        subjects: context.subjects(),
        permissions: permissions.iter().collect(),
        allowlist: if relevant { allowlist } else { &[] },
    };

    let located = locate_key(index, key);
    let verdicts = builder.initial(&located);
    Ok(builder.visit(document, located.target.as_ref(), &verdicts, &JsonPointer::root()))
}

pub(crate) fn build_view<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    document: &Value,
    context: &AuthorizationContext,
    allowlist: &[JsonPointer],
    permissions: &Permissions,
) -> Result<Value> {
    let view = filter(index, key, document, context, allowlist, permissions)?;
    trace!(
        "Built JSON view on {} for {}: visible={}",
        key,
        permissions,
        view.is_some()
    );
    Ok(view.unwrap_or_else(|| Value::Object(Map::new())))
}

pub(crate) fn accessible_paths<I: PermissionIndex>(
    index: &I,
    key: &ResourceKey,
    document: &Value,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> Result<BTreeSet<ResourceKey>> {
    let mut paths = BTreeSet::new();
    if let Some(view) = filter(index, key, document, context, &[], permissions)? {
        collect_leaves(&view, &JsonPointer::root(), &mut |relative: &JsonPointer| {
            // Fields named with `/` or nothing have no resource key.
            if relative.is_addressable() {
                paths.insert(key.join(relative));
            }
        });
    }
    Ok(paths)
}

fn collect_leaves(value: &Value, path: &JsonPointer, sink: &mut impl FnMut(&JsonPointer)) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            for (field, child) in fields {
                collect_leaves(child, &path.child_field(field), sink);
            }
        }
        _ => sink(path),
    }
}
