//! Collision error types.

use fletch_common::ColliderId;
use thiserror::Error;

/// Errors raised by misconfigured collision nodes or stale handles.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollisionError {
    /// A node was built without a shape
    #[error("collision node has no shape")]
    MissingShape,

    /// A shape has non-finite or non-positive dimensions
    #[error("invalid collision shape: {reason}")]
    InvalidShape {
        /// What was wrong
        reason: String,
    },

    /// No node is registered under this id
    #[error("unknown collider: {0}")]
    UnknownCollider(ColliderId),
}
