//! Error type raised by consumption steps.

use thiserror::Error;

/// A validation rule rejected a resource attribute.
///
/// Traversal is generic over the step's error type, so frameworks with
/// richer error enums can use their own; this type covers the common case
/// and is what the crate's own tests propagate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameter {name} {message}")]
pub struct ValidationFailure {
    /// User-facing parameter identifier, e.g. `orders[2].lines[0].sku`.
    pub name: String,
    /// Rule-specific message, e.g. `is missing`.
    pub message: String,
}

impl ValidationFailure {
    /// Create a failure for the named parameter.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}
