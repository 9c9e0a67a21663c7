//! Core value types shared by the policy model and the enforcers.
//!
//! All of these are plain immutable values: subjects and permissions are
//! compared by string value, resource keys by `(type, path)`.

use crate::error::{EnforcerError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Permission to read a resource.
pub const READ: &str = "READ";

/// Permission to modify a resource.
pub const WRITE: &str = "WRITE";

/// An authenticated principal, e.g. `"oauth2:alice"`.
///
/// Subjects are opaque by the time they reach the enforcer: the issuer prefix
/// carries no meaning here and equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a new subject identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SubjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The subjects on whose behalf a request is made.
///
/// The context holds a permission if *any* of its subjects does. Subjects keep
/// their insertion order; duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    subjects: Vec<SubjectId>,
}

impl AuthorizationContext {
    /// Creates a context from the given subjects.
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubjectId>,
    {
        subjects.into_iter().collect()
    }

    /// The subjects of this context, in insertion order.
    pub fn subjects(&self) -> &[SubjectId] {
        &self.subjects
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s.as_str() == subject)
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl<S: Into<SubjectId>> FromIterator<S> for AuthorizationContext {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let subjects = iter
            .into_iter()
            .map(Into::<SubjectId>::into)
            .filter(|subject| seen.insert(subject.clone()))
            .collect();
        Self { subjects }
    }
}

/// An ordered, deduplicated set of permission names such as `READ` or `WRITE`.
///
/// Names are case-sensitive. A set may be empty inside a policy entry (a
/// resource with nothing revoked), but every query rejects an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    /// Creates a permission set from the given names.
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        permissions.into_iter().collect()
    }

    /// The set containing only [`READ`].
    pub fn read() -> Self {
        Self::new([READ])
    }

    /// The set containing only [`WRITE`].
    pub fn write() -> Self {
        Self::new([WRITE])
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Iterates the permission names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rejects the empty set, which is meaningless for a grant check.
    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(EnforcerError::EmptyPermissions);
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for Permissions {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// The namespace a resource path lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Thing,
    Policy,
    Message,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Thing => "thing",
            ResourceType::Policy => "policy",
            ResourceType::Message => "message",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = EnforcerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "thing" => Ok(ResourceType::Thing),
            "policy" => Ok(ResourceType::Policy),
            "message" => Ok(ResourceType::Message),
            other => Err(EnforcerError::UnknownResourceType(other.to_string())),
        }
    }
}

/// A hierarchical path such as `/features/firmware/properties`.
///
/// Parsing is lenient: empty segments (`//`, a trailing `/`) are dropped, so
/// `""`, `"/"` and `"//"` all denote the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// The empty pointer, addressing the whole resource.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(pointer: &str) -> Self {
        Self::from_segments(pointer.split('/'))
    }

    /// Builds a pointer from segments, splitting any segment that contains `/`.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pointer = Self::root();
        for segment in segments {
            pointer.push(segment.as_ref());
        }
        pointer
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new pointer one level deeper.
    pub fn child(&self, segment: &str) -> Self {
        let mut pointer = self.clone();
        pointer.push(segment);
        pointer
    }

    /// Returns a new pointer one level deeper whose last segment is `field`
    /// verbatim, even when it contains `/` or is empty.
    pub(crate) fn child_field(&self, field: &str) -> Self {
        let mut pointer = self.clone();
        pointer.segments.push(field.to_string());
        pointer
    }

    /// Whether a parsed pointer string could produce these segments.
    pub(crate) fn is_addressable(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| !segment.is_empty() && !segment.contains('/'))
    }

    /// Appends `other` to this pointer.
    pub fn join(&self, other: &JsonPointer) -> Self {
        let mut pointer = self.clone();
        pointer.segments.extend(other.segments.iter().cloned());
        pointer
    }

    pub fn starts_with(&self, prefix: &JsonPointer) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    fn push(&mut self, segment: &str) {
        self.segments.extend(
            segment
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for JsonPointer {
    fn from(pointer: &str) -> Self {
        Self::parse(pointer)
    }
}

impl From<String> for JsonPointer {
    fn from(pointer: String) -> Self {
        Self::parse(&pointer)
    }
}

impl From<JsonPointer> for String {
    fn from(pointer: JsonPointer) -> Self {
        pointer.to_string()
    }
}

impl FromStr for JsonPointer {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Infallible> {
        Ok(Self::parse(s))
    }
}

/// Addresses a node inside a resource namespace, written `thing:/attributes/foo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
    resource_type: ResourceType,
    path: JsonPointer,
}

impl ResourceKey {
    pub fn new(resource_type: ResourceType, path: impl Into<JsonPointer>) -> Self {
        Self {
            resource_type,
            path: path.into(),
        }
    }

    /// A key in the `thing` namespace.
    pub fn thing(path: impl Into<JsonPointer>) -> Self {
        Self::new(ResourceType::Thing, path)
    }

    /// A key in the `policy` namespace.
    pub fn policy(path: impl Into<JsonPointer>) -> Self {
        Self::new(ResourceType::Policy, path)
    }

    /// A key in the `message` namespace.
    pub fn message(path: impl Into<JsonPointer>) -> Self {
        Self::new(ResourceType::Message, path)
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// Returns the key of a node below this one, in the same namespace.
    pub fn join(&self, relative: &JsonPointer) -> Self {
        Self {
            resource_type: self.resource_type,
            path: self.path.join(relative),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.path)
    }
}

impl FromStr for ResourceKey {
    type Err = EnforcerError;

    fn from_str(s: &str) -> Result<Self> {
        let (resource_type, path) = s.split_once(':').ok_or_else(|| {
            EnforcerError::InvalidResourceKey(format!("`{s}` (expected \"<type>:<path>\")"))
        })?;
        Ok(Self::new(resource_type.parse()?, JsonPointer::parse(path)))
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = EnforcerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}
