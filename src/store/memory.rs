//! In-memory [`ReplyStore`] for tests and local embedding.
//!
//! Tracks a flat count table plus the calling user's own vote per target,
//! and supports scripting the next failures so rollback paths can be
//! exercised deterministically.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::state::{ReplyId, ReplyNode, ThreadRoot, VoteDirection};
use crate::store::{EditReceipt, ReplyStore, VoteReceipt};

#[derive(Debug, Default)]
struct Inner {
    counts: HashMap<ReplyId, (u32, u32)>,
    own_votes: HashMap<ReplyId, VoteDirection>,
    reports: Vec<(ReplyId, String)>,
    accepted: Option<ReplyId>,
    fail_queue: VecDeque<StoreError>,
}

/// In-memory reply store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed counts from a thread snapshot (root and all materialized
    /// replies become known targets).
    pub fn seed_thread(root: &ThreadRoot) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            inner
                .counts
                .insert(root.id.clone(), (root.like_count, root.dislike_count));
            if let Some(direction) = root.own_vote {
                inner.own_votes.insert(root.id.clone(), direction);
            }
            let mut stack: Vec<&ReplyNode> = root.replies.iter().collect();
            while let Some(node) = stack.pop() {
                inner
                    .counts
                    .insert(node.id.clone(), (node.like_count, node.dislike_count));
                if node.is_accepted {
                    inner.accepted = Some(node.id.clone());
                }
                if let Some(direction) = node.own_vote {
                    inner.own_votes.insert(node.id.clone(), direction);
                }
                stack.extend(node.children.iter());
            }
        }
        store
    }

    /// Script the next call to fail with `err`. Queued failures apply in
    /// order, one per call.
    pub fn fail_next(&self, err: StoreError) {
        self.inner.lock().fail_queue.push_back(err);
    }

    /// Reports filed so far, for assertions.
    pub fn reports(&self) -> Vec<(ReplyId, String)> {
        self.inner.lock().reports.clone()
    }

    /// Currently accepted reply, for assertions.
    pub fn accepted(&self) -> Option<ReplyId> {
        self.inner.lock().accepted.clone()
    }

    /// Authoritative counts for a target, for assertions.
    pub fn counts(&self, target: &ReplyId) -> Option<(u32, u32)> {
        self.inner.lock().counts.get(target).copied()
    }
}

impl Inner {
    fn take_scripted_failure(&mut self) -> Result<(), StoreError> {
        match self.fail_queue.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn counts_mut(&mut self, target: &ReplyId) -> Result<&mut (u32, u32), StoreError> {
        self.counts
            .get_mut(target)
            .ok_or_else(|| StoreError::Rejected(format!("unknown target: {target}")))
    }
}

fn bucket(counts: &mut (u32, u32), direction: VoteDirection) -> &mut u32 {
    match direction {
        VoteDirection::Up => &mut counts.0,
        VoteDirection::Down => &mut counts.1,
    }
}

#[async_trait]
impl ReplyStore for MemoryStore {
    async fn vote(
        &self,
        target: &ReplyId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        let prior = inner.own_votes.get(target).copied();
        let counts = inner.counts_mut(target)?;
        if let Some(prior) = prior {
            *bucket(counts, prior) = bucket(counts, prior).saturating_sub(1);
        }
        *bucket(counts, direction) += 1;
        let (like_count, dislike_count) = *counts;
        inner.own_votes.insert(target.clone(), direction);
        Ok(VoteReceipt {
            like_count,
            dislike_count,
        })
    }

    async fn retract_vote(&self, target: &ReplyId) -> Result<VoteReceipt, StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        let prior = inner.own_votes.remove(target);
        let counts = inner.counts_mut(target)?;
        if let Some(prior) = prior {
            *bucket(counts, prior) = bucket(counts, prior).saturating_sub(1);
        }
        let (like_count, dislike_count) = *counts;
        Ok(VoteReceipt {
            like_count,
            dislike_count,
        })
    }

    async fn reply(
        &self,
        parent: Option<&ReplyId>,
        author_id: &str,
        author: &str,
        content: &str,
    ) -> Result<ReplyNode, StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        if let Some(parent) = parent {
            inner.counts_mut(parent)?;
        }
        let node = ReplyNode {
            id: ReplyId::new(Uuid::new_v4().to_string()),
            author_id: author_id.to_string(),
            author: author.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            edited_at: None,
            like_count: 0,
            dislike_count: 0,
            is_hidden: false,
            is_accepted: false,
            own_vote: None,
            children: Vec::new(),
        };
        inner.counts.insert(node.id.clone(), (0, 0));
        Ok(node)
    }

    async fn edit(&self, target: &ReplyId, content: &str) -> Result<EditReceipt, StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        inner.counts_mut(target)?;
        Ok(EditReceipt {
            content: content.to_string(),
            edited_at: Utc::now(),
        })
    }

    async fn delete(&self, target: &ReplyId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        if inner.counts.remove(target).is_none() {
            return Err(StoreError::Rejected(format!("unknown target: {target}")));
        }
        inner.own_votes.remove(target);
        if inner.accepted.as_ref() == Some(target) {
            inner.accepted = None;
        }
        Ok(())
    }

    async fn report(&self, target: &ReplyId, reason: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        inner.counts_mut(target)?;
        inner.reports.push((target.clone(), reason.to_string()));
        Ok(())
    }

    async fn set_accepted(&self, target: &ReplyId, accepted: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.take_scripted_failure()?;
        inner.counts_mut(target)?;
        if accepted {
            inner.accepted = Some(target.clone());
        } else if inner.accepted.as_ref() == Some(target) {
            inner.accepted = None;
        }
        Ok(())
    }
}
