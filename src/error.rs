//! Unified error handling for the braid discussion engine.
//!
//! Three families, per the engine's propagation policy: validation errors
//! are resolved locally before anything is dispatched to the persistence
//! boundary; store errors arrive from the boundary and trigger rollback of
//! the one optimistic change they belong to; structural violations mean the
//! boundary handed us input that is not a tree, which is a contract bug and
//! fails loudly at ingest time.

use crate::state::ReplyId;
use thiserror::Error;

// ============================================================================
// Validation Errors (rejected before dispatch)
// ============================================================================

/// Errors detected locally, before any persistence-boundary call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("report reason must not be empty")]
    EmptyReason,

    #[error("thread is locked")]
    ThreadLocked,

    #[error("only the author may perform this operation")]
    NotAuthor,

    #[error("no such target: {0}")]
    UnknownTarget(ReplyId),

    #[error("another reply is already accepted: {0}")]
    AlreadyAccepted(ReplyId),
}

impl ValidationError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "empty_content",
            Self::EmptyReason => "empty_reason",
            Self::ThreadLocked => "thread_locked",
            Self::NotAuthor => "not_author",
            Self::UnknownTarget(_) => "unknown_target",
            Self::AlreadyAccepted(_) => "already_accepted",
        }
    }
}

// ============================================================================
// Store Errors (persistence boundary failures)
// ============================================================================

/// Failures reported by (or on the way to) the persistence boundary.
///
/// A store error rolls back the specific optimistic change it belongs to and
/// is surfaced to the caller. It never cascades to sibling or ancestor nodes
/// and is never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The boundary processed the request and said no.
    #[error("store rejected the request: {0}")]
    Rejected(String),

    /// The request never completed (transport failure, service down).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

// ============================================================================
// Structural Violations (boundary contract bugs)
// ============================================================================

/// The boundary supplied input that is not a tree.
///
/// A node reachable from two parents manifests as a duplicate id during the
/// checked arena rebuild. This is a programming error on the boundary's
/// side, not a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralViolation {
    #[error("duplicate node id in reply tree: {0}")]
    DuplicateId(ReplyId),
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Any error a `ThreadSession` operation can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Structure(#[from] StructuralViolation),
}

impl ThreadError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Structure(_) => "structural_violation",
        }
    }
}
