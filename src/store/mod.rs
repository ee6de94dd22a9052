//! Persistence boundary abstraction.
//!
//! The engine never talks to a wire format of its own; it hands intents to a
//! [`ReplyStore`] and reconciles local state from the receipts. Every
//! mutation returns authoritative values, which always win over the local
//! optimistic guess.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::state::{ReplyId, ReplyNode, VoteDirection};

pub mod memory;

pub use memory::MemoryStore;

/// Authoritative counts after a vote or retraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub like_count: u32,
    pub dislike_count: u32,
}

/// Confirmed content after an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditReceipt {
    pub content: String,
    pub edited_at: DateTime<Utc>,
}

/// The reply-persistence service.
///
/// Implementations own policy questions the engine deliberately does not:
/// what happens to a deleted node's subtree upstream, how votes from other
/// users fold into counts, retention of reports.
#[async_trait]
pub trait ReplyStore: Send + Sync {
    /// Cast or change a vote on a node (the thread root included).
    async fn vote(
        &self,
        target: &ReplyId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, StoreError>;

    /// Withdraw the caller's vote on a node.
    async fn retract_vote(&self, target: &ReplyId) -> Result<VoteReceipt, StoreError>;

    /// Create a reply; `parent = None` replies to the thread root. Returns
    /// the confirmed node (the only way a node ever enters the tree).
    async fn reply(
        &self,
        parent: Option<&ReplyId>,
        author_id: &str,
        author: &str,
        content: &str,
    ) -> Result<ReplyNode, StoreError>;

    /// Replace a node's content.
    async fn edit(&self, target: &ReplyId, content: &str) -> Result<EditReceipt, StoreError>;

    /// Delete a node. Subtree disposition upstream is this store's policy.
    async fn delete(&self, target: &ReplyId) -> Result<(), StoreError>;

    /// File a moderation report against a node.
    async fn report(&self, target: &ReplyId, reason: &str) -> Result<(), StoreError>;

    /// Mark or unmark a reply as the accepted answer.
    async fn set_accepted(&self, target: &ReplyId, accepted: bool) -> Result<(), StoreError>;
}
