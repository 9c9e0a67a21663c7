//! Error types for the policy enforcer.
//!
//! Only malformed call-site arguments and malformed policy documents are
//! errors. Missing data (a resource type without entries, an empty
//! authorization context, a path no entry mentions) always resolves to a
//! deny-by-default answer instead.

use thiserror::Error;

/// Errors that can occur while building or querying an enforcer.
#[derive(Debug, Error)]
pub enum EnforcerError {
    /// A query was made with an empty permission set.
    ///
    /// "No permission requested" cannot be granted or denied, so it is
    /// rejected before any lookup happens.
    #[error("At least one permission is required")]
    EmptyPermissions,

    /// A resource key string could not be parsed.
    ///
    /// Resource keys have the form `<type>:<pointer>`, e.g. `thing:/attributes`.
    #[error("Invalid resource key: {0}")]
    InvalidResourceKey(String),

    /// A resource key named a type other than `thing`, `policy` or `message`.
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// An enforcer strategy name was not recognized.
    #[error("Unknown enforcer strategy: {0}")]
    UnknownStrategy(String),

    /// A policy document is structurally invalid.
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// A policy document could not be decoded.
    #[error("Policy decoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for enforcer operations.
pub type Result<T> = std::result::Result<T, EnforcerError>;
