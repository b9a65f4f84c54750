//! # Error Types
//!
//! Every failure the directory reports is a [`DirectoryError`]. Client
//! errors (everything except [`DirectoryError::Unexpected`]) are terminal
//! for the request and correctable by changing the request. Nothing is
//! retried.

use thiserror::Error;

use crate::hierarchy::MAX_DEPTH;
use crate::identity::{ActivityId, BuildingId, OrganizationId};

/// The kind of entity a [`DirectoryError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Building,
    Activity,
    Organization,
}

impl EntityKind {
    /// Return the entity name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "Building",
            Self::Activity => "Activity",
            Self::Organization => "Organization",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for directory operations.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// A referenced entity id does not exist.
    #[error("{kind}({id}) not found")]
    NotFound {
        /// Kind of the missing entity.
        kind: EntityKind,
        /// Raw key that was looked up.
        id: i64,
    },

    /// Attaching a subtree under `parent_id` would exceed the nesting bound.
    #[error(
        "activity cannot be nested under parent {}: nesting depth must be <= {}, parent depth is {}, subtree height is {}",
        .parent_id,
        MAX_DEPTH,
        .parent_depth,
        .subtree_height
    )]
    DepthExceeded {
        /// The proposed parent.
        parent_id: ActivityId,
        /// Depth of the proposed parent at the time of the check.
        parent_depth: usize,
        /// Levels in the subtree being placed; 1 for a new or leaf node.
        subtree_height: usize,
    },

    /// An activity was asked to become its own parent.
    #[error("activity {0} cannot be parent of itself")]
    SelfParent(ActivityId),

    /// A storage-level referential constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A field failed validation before reaching the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// Anything else. The message is for operators, never for callers.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl DirectoryError {
    pub fn building_not_found(id: BuildingId) -> Self {
        Self::NotFound {
            kind: EntityKind::Building,
            id: id.get(),
        }
    }

    pub fn activity_not_found(id: ActivityId) -> Self {
        Self::NotFound {
            kind: EntityKind::Activity,
            id: id.get(),
        }
    }

    pub fn organization_not_found(id: OrganizationId) -> Self {
        Self::NotFound {
            kind: EntityKind::Organization,
            id: id.get(),
        }
    }

    /// Whether the caller can fix this error by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_exceeded_message_names_parent_and_depth() {
        let err = DirectoryError::DepthExceeded {
            parent_id: ActivityId(12),
            parent_depth: 3,
            subtree_height: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("parent 12"), "got: {msg}");
        assert!(msg.contains("parent depth is 3"), "got: {msg}");
        assert!(msg.contains("<= 3"), "got: {msg}");
    }

    #[test]
    fn depth_exceeded_message_reports_moved_subtree_height() {
        let err = DirectoryError::DepthExceeded {
            parent_id: ActivityId(10),
            parent_depth: 1,
            subtree_height: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("parent depth is 1"), "got: {msg}");
        assert!(msg.contains("subtree height is 3"), "got: {msg}");
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = DirectoryError::building_not_found(BuildingId(5));
        assert_eq!(err.to_string(), "Building(5) not found");
        let err = DirectoryError::activity_not_found(ActivityId(6));
        assert_eq!(err.to_string(), "Activity(6) not found");
    }

    #[test]
    fn only_unexpected_is_a_server_error() {
        assert!(DirectoryError::SelfParent(ActivityId(1)).is_client_error());
        assert!(DirectoryError::ConstraintViolation("fk".into()).is_client_error());
        assert!(!DirectoryError::Unexpected("io".into()).is_client_error());
    }
}
