//! Error types for tree mutation and reconciliation

use crate::ast::{ChildShape, NodeKind, StableNodeId};
use crate::mutation::LimitedResource;
use crate::overlay::{ConflictReason, WorkerId};
use thiserror::Error;

/// Main error type for the mutation engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StylerError {
    /// A stated child or sibling is not a member of the stated parent
    #[error("Node {child} is not a child of {parent} ({child_count} children)")]
    NotAChild {
        parent: StableNodeId,
        child: StableNodeId,
        child_count: usize,
    },

    /// A depth, modification or block threshold would be crossed
    #[error(
        "Resource limit exceeded for {resource}: attempted {attempted}, limit {limit}{}",
        at_node(.node)
    )]
    ResourceLimitExceeded {
        resource: LimitedResource,
        attempted: usize,
        limit: usize,
        node: Option<StableNodeId>,
    },

    /// Two overlays touched the same logical node
    #[error(
        "Conflicting modifications to node {node} from workers: {}",
        join_workers(.workers)
    )]
    Conflict {
        node: StableNodeId,
        workers: Vec<WorkerId>,
        reason: ConflictReason,
    },

    /// A node is not reachable from the expected root
    #[error("Invalid tree state: {message}")]
    InvalidTreeState { message: String },

    /// A node's children do not fit its grammar shape
    #[error("Shape violation: {kind} requires {expected}, found {actual}")]
    ShapeViolation {
        kind: NodeKind,
        expected: ChildShape,
        actual: usize,
    },

    #[error("Invalid node: {message}")]
    InvalidNode { message: String },

    /// Configuration parsing or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

fn at_node(node: &Option<StableNodeId>) -> String {
    match node {
        Some(node) => format!(" at {node}"),
        None => String::new(),
    }
}

fn join_workers(workers: &[WorkerId]) -> String {
    workers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotAChild,
    ResourceLimit,
    Conflict,
    InvalidTreeState,
    Shape,
    InvalidNode,
    Config,
}

impl StylerError {
    /// Get the error kind for categorization
    pub fn kind(&self) -> ErrorKind {
        match self {
            StylerError::NotAChild { .. } => ErrorKind::NotAChild,
            StylerError::ResourceLimitExceeded { .. } => ErrorKind::ResourceLimit,
            StylerError::Conflict { .. } => ErrorKind::Conflict,
            StylerError::InvalidTreeState { .. } => ErrorKind::InvalidTreeState,
            StylerError::ShapeViolation { .. } => ErrorKind::Shape,
            StylerError::InvalidNode { .. } => ErrorKind::InvalidNode,
            StylerError::ConfigError { .. } => ErrorKind::Config,
        }
    }

    /// Check if this error only aborts the offending edit.
    ///
    /// Resource exhaustion, conflicts and stale references invalidate the
    /// whole pass over a file and must not be skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotAChild | ErrorKind::Shape | ErrorKind::InvalidNode
        )
    }

    pub fn not_a_child(parent: StableNodeId, child: StableNodeId, child_count: usize) -> Self {
        Self::NotAChild {
            parent,
            child,
            child_count,
        }
    }

    pub fn resource_limit(
        resource: LimitedResource,
        attempted: usize,
        limit: usize,
        node: Option<StableNodeId>,
    ) -> Self {
        Self::ResourceLimitExceeded {
            resource,
            attempted,
            limit,
            node,
        }
    }

    pub fn conflict(node: StableNodeId, workers: Vec<WorkerId>, reason: ConflictReason) -> Self {
        Self::Conflict {
            node,
            workers,
            reason,
        }
    }

    pub fn invalid_tree_state(message: impl Into<String>) -> Self {
        Self::InvalidTreeState {
            message: message.into(),
        }
    }

    pub fn invalid_node(message: impl Into<String>) -> Self {
        Self::InvalidNode {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
