//! Boundary-crossing thread and reply types.
//!
//! These are the shapes the persistence boundary hands us. Counts are
//! authoritative (server-confirmed); optimistic adjustments live in the
//! session's overlay map, never in these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::overlay::VoteDirection;

/// Opaque reply identifier, unique within a thread.
///
/// Ordered so that deterministic tie-breaking in the sort engine is a plain
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyId(pub String);

impl ReplyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReplyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single reply as confirmed by the persistence boundary.
///
/// Child order is insignificant; display order is always recomputed by the
/// sort engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyNode {
    pub id: ReplyId,
    pub author_id: String,
    /// Display name, opaque to the engine.
    pub author: String,
    /// Opaque text payload; sanitization is upstream's concern.
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    pub like_count: u32,
    pub dislike_count: u32,
    /// Moderation flag. Hidden nodes render as placeholders but their
    /// children stay reachable.
    #[serde(default)]
    pub is_hidden: bool,
    /// Accepted-answer mark; at most one per thread.
    #[serde(default)]
    pub is_accepted: bool,
    /// The viewer's own confirmed vote, when the boundary reports it.
    /// Seeds the session's overlay so a repeat click retracts.
    #[serde(default)]
    pub own_vote: Option<VoteDirection>,
    #[serde(default)]
    pub children: Vec<ReplyNode>,
}

/// The top-level post a thread hangs off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRoot {
    pub id: ReplyId,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub dislike_count: u32,
    /// Authoritative total; may exceed the number of materialized nodes.
    pub reply_count: u32,
    /// Suppresses new replies and voting at every depth.
    #[serde(default)]
    pub is_locked: bool,
    /// Display metadata only; the engine just passes it through.
    #[serde(default)]
    pub is_pinned: bool,
    /// The viewer's own confirmed vote on the post itself.
    #[serde(default)]
    pub own_vote: Option<VoteDirection>,
    #[serde(default)]
    pub replies: Vec<ReplyNode>,
}
