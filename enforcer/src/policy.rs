//! The immutable policy snapshot an enforcer is built from.
//!
//! A snapshot is an ordered list of labelled entries. Each entry binds a set
//! of subjects to per-resource grant/revoke permission sets. Entries are not
//! required to agree with each other: the enforcer merges them by union.
//!
//! The serialized form keys entries by label and keeps their document order:
//!
//! ```json
//! {
//!   "policyId": "org.example:twin-1",
//!   "revision": 4,
//!   "entries": {
//!     "OWNER": {
//!       "subjects": { "oauth2:alice": { "type": "user" } },
//!       "resources": {
//!         "thing:/": { "grant": ["READ", "WRITE"], "revoke": [] }
//!       }
//!     }
//!   }
//! }
//! ```

use crate::error::{EnforcerError, Result};
use crate::types::{Permissions, ResourceKey, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The permissions an entry grants and revokes on one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectedPermissions {
    #[serde(default)]
    pub grant: Permissions,
    #[serde(default)]
    pub revoke: Permissions,
}

/// Descriptive data attached to a subject of an entry.
///
/// Neither field influences enforcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
    /// Whether the subject was pulled in from an imported policy.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub imported: bool,
}

/// One labelled rule set of a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
    label: String,
    subjects: BTreeMap<SubjectId, SubjectDescriptor>,
    resources: BTreeMap<ResourceKey, EffectedPermissions>,
}

impl PolicyEntry {
    /// Creates an empty entry with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            subjects: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Adds a subject to the entry.
    pub fn subject(self, subject: impl Into<SubjectId>) -> Self {
        self.subject_with(subject, SubjectDescriptor::default())
    }

    /// Adds a subject with descriptive data to the entry.
    pub fn subject_with(
        mut self,
        subject: impl Into<SubjectId>,
        descriptor: SubjectDescriptor,
    ) -> Self {
        self.subjects.insert(subject.into(), descriptor);
        self
    }

    /// Grants `permissions` on `resource`, merging with earlier grants.
    pub fn grant<I, S>(mut self, resource: ResourceKey, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources
            .entry(resource)
            .or_default()
            .grant
            .extend(permissions);
        self
    }

    /// Revokes `permissions` on `resource`, merging with earlier revokes.
    pub fn revoke<I, S>(mut self, resource: ResourceKey, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources
            .entry(resource)
            .or_default()
            .revoke
            .extend(permissions);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn subjects(&self) -> &BTreeMap<SubjectId, SubjectDescriptor> {
        &self.subjects
    }

    pub fn resources(&self) -> &BTreeMap<ResourceKey, EffectedPermissions> {
        &self.resources
    }
}

/// The whole policy at one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<u64>,
    #[serde(default, with = "entries_by_label")]
    entries: Vec<PolicyEntry>,
}

impl PolicySnapshot {
    pub fn builder() -> PolicySnapshotBuilder {
        PolicySnapshotBuilder::default()
    }

    /// Decodes a snapshot from its JSON text form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes a snapshot from an already parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encodes the snapshot in its JSON form.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }

    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    /// The entries in document order.
    pub fn entries(&self) -> &[PolicyEntry] {
        &self.entries
    }

    pub fn entry(&self, label: &str) -> Option<&PolicyEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assembles a [`PolicySnapshot`] in code.
#[derive(Debug, Default)]
pub struct PolicySnapshotBuilder {
    policy_id: Option<String>,
    revision: Option<u64>,
    entries: Vec<PolicyEntry>,
}

impl PolicySnapshotBuilder {
    pub fn policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Appends an entry; labels must be unique.
    pub fn entry(mut self, entry: PolicyEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> Result<PolicySnapshot> {
        for (index, entry) in self.entries.iter().enumerate() {
            if self.entries[..index].iter().any(|e| e.label == entry.label) {
                return Err(EnforcerError::InvalidPolicy(format!(
                    "duplicate entry label `{}`",
                    entry.label
                )));
            }
        }
        Ok(PolicySnapshot {
            policy_id: self.policy_id,
            revision: self.revision,
            entries: self.entries,
        })
    }
}

/// Serializes entries as a map keyed by label, keeping document order.
mod entries_by_label {
    use super::{EffectedPermissions, PolicyEntry, SubjectDescriptor};
    use crate::types::{ResourceKey, SubjectId};
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;
    use std::fmt;

    #[derive(Serialize)]
    struct EntryBodyRef<'a> {
        subjects: &'a BTreeMap<SubjectId, SubjectDescriptor>,
        resources: &'a BTreeMap<ResourceKey, EffectedPermissions>,
    }

    #[derive(Deserialize)]
    struct EntryBody {
        #[serde(default)]
        subjects: BTreeMap<SubjectId, SubjectDescriptor>,
        #[serde(default)]
        resources: BTreeMap<ResourceKey, EffectedPermissions>,
    }

    pub fn serialize<S: Serializer>(
        entries: &[PolicyEntry],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for entry in entries {
            let body = EntryBodyRef {
                subjects: &entry.subjects,
                resources: &entry.resources,
            };
            map.serialize_entry(&entry.label, &body)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<PolicyEntry>, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }

    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<PolicyEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of policy entries keyed by label")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries: Vec<PolicyEntry> = Vec::new();
            while let Some((label, body)) = access.next_entry::<String, EntryBody>()? {
                if entries.iter().any(|e| e.label == label) {
                    return Err(de::Error::custom(format!(
                        "duplicate policy entry label `{label}`"
                    )));
                }
                entries.push(PolicyEntry {
                    label,
                    subjects: body.subjects,
                    resources: body.resources,
                });
            }
            Ok(entries)
        }
    }
}
