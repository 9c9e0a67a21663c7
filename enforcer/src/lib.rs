//! Policy enforcer for digital twin resources.
//!
//! This crate turns a policy snapshot (labelled entries granting and revoking
//! permissions for subjects on resource paths) into an immutable, query
//! optimized [`Enforcer`]. An enforcer can
//!
//! - decide whether an authorization context may access a resource, either
//!   entirely ([`Enforcer::has_unrestricted_permissions`]) or in part
//!   ([`Enforcer::has_partial_permissions`]),
//! - list the subjects holding permissions at or below a resource, and
//! - filter a JSON document down to what a context may see
//!   ([`Enforcer::build_json_view`]).
//!
//! # Resolution rules
//!
//! For a subject and permission, every node on the path from the namespace
//! root to the queried resource may grant, revoke, or say nothing. The
//! deepest node that says something decides, and a node that both grants and
//! revokes revokes. Entries are merged by union, so labels never take
//! precedence over one another.
//!
//! # Strategies
//!
//! Two index layouts answer the same queries:
//!
//! - **Throughput-optimized** ([`TrieBasedEnforcer`], the default) materializes
//!   a path trie with every subtree union precomputed.
//! - **Memory-optimized** ([`TreeBasedEnforcer`]) keeps one sorted rule per
//!   entry and resource and derives node data per query.
//!
//! Pick one through the [`factory`] functions.
//!
//! # Example
//!
//! ```rust
//! use enforcer::{
//!     factory, AuthorizationContext, Permissions, PolicyEntry, PolicySnapshot, ResourceKey,
//! };
//! use serde_json::json;
//!
//! let snapshot = PolicySnapshot::builder()
//!     .entry(
//!         PolicyEntry::new("OWNER")
//!             .subject("oauth2:alice")
//!             .grant(ResourceKey::thing("/"), ["READ", "WRITE"])
//!             .revoke(ResourceKey::thing("/attributes/secret"), ["READ"]),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let enforcer = factory::default_evaluator(&snapshot);
//! let alice = AuthorizationContext::new(["oauth2:alice"]);
//! let root = ResourceKey::thing("/");
//!
//! assert!(enforcer.has_partial_permissions(&root, &alice, &Permissions::read()).unwrap());
//! assert!(!enforcer.has_unrestricted_permissions(&root, &alice, &Permissions::read()).unwrap());
//!
//! let thing = json!({ "thingId": "t1", "attributes": { "secret": 1, "location": "lab" } });
//! let view = enforcer.build_json_view(&root, &thing, &alice, &Permissions::read()).unwrap();
//! assert_eq!(view, json!({ "thingId": "t1", "attributes": { "location": "lab" } }));
//! ```

pub mod enforcer;
pub mod error;
pub mod factory;
pub mod index;
pub mod policy;
pub mod types;

mod json_view;
mod resolution;

pub use enforcer::{
    EffectedSubjects, Enforcer, IndexedEnforcer, SubjectClassification, TreeBasedEnforcer,
    TrieBasedEnforcer,
};
pub use error::{EnforcerError, Result};
pub use factory::EnforcerStrategy;
pub use policy::{EffectedPermissions, PolicyEntry, PolicySnapshot, SubjectDescriptor};
pub use types::{
    AuthorizationContext, JsonPointer, Permissions, ResourceKey, ResourceType, SubjectId, READ,
    WRITE,
};
