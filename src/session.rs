//! Thread session coordinator.
//!
//! One [`ThreadSession`] exclusively owns a thread's materialized state: the
//! root post's own vote overlay and collapse flag, the flat reply arena, the
//! per-node overlay map, and the viewer's collapse set. It is the single
//! entry point: it serves sort/render/collapse from local state and forwards
//! vote/reply/edit/delete/report intents to the [`ReplyStore`], reconciling
//! on each response. Mutations are synchronous with respect to each other;
//! the only suspension points are the store calls.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{StoreError, StructuralViolation, ThreadError, ValidationError};
use crate::render::{RenderNode, RenderParams, render_tree};
use crate::state::{ReplyArena, ReplyId, ThreadRoot, VoteDirection, VoteDispatch, VoteOverlay};
use crate::store::{ReplyStore, VoteReceipt};
use crate::vote::VoteController;

/// Root post fields the session keeps current.
#[derive(Debug, Clone)]
struct RootState {
    id: ReplyId,
    author_id: String,
    content: String,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    like_count: u32,
    dislike_count: u32,
    reply_count: u32,
    is_locked: bool,
    is_pinned: bool,
}

/// Rendered root post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootView {
    pub id: ReplyId,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    /// Effective (overlay-adjusted) counts.
    pub like_count: u32,
    pub dislike_count: u32,
    pub own_vote: Option<VoteDirection>,
    pub vote_in_flight: bool,
    pub reply_count: u32,
    pub is_locked: bool,
    pub is_pinned: bool,
    pub collapsed: bool,
}

/// Fully sorted, depth-annotated, vote-overlaid view of a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadView {
    pub root: RootView,
    /// Replies in display order; empty when the root is collapsed.
    pub nodes: Vec<RenderNode>,
}

/// Coordinator for one thread.
pub struct ThreadSession<S> {
    store: S,
    config: EngineConfig,
    root: RootState,
    root_overlay: VoteOverlay,
    root_collapsed: bool,
    arena: ReplyArena,
    overlays: HashMap<ReplyId, VoteOverlay>,
    collapsed: HashSet<ReplyId>,
}

impl<S: ReplyStore> ThreadSession<S> {
    /// Ingest a thread from the persistence boundary.
    ///
    /// Fails loudly if the supplied reply structure is not a tree.
    pub fn new(root: ThreadRoot, store: S) -> Result<Self, StructuralViolation> {
        Self::with_config(root, store, EngineConfig::default())
    }

    pub fn with_config(
        root: ThreadRoot,
        store: S,
        config: EngineConfig,
    ) -> Result<Self, StructuralViolation> {
        let arena = ReplyArena::from_tree(&root.replies)?;

        // Boundary-reported own votes become confirmed overlays, so a
        // repeat click on the same direction retracts instead of re-voting.
        let mut overlays = HashMap::new();
        let mut stack: Vec<&crate::state::ReplyNode> = root.replies.iter().collect();
        while let Some(node) = stack.pop() {
            if node.own_vote.is_some() {
                overlays.insert(node.id.clone(), VoteOverlay::with_confirmed(node.own_vote));
            }
            stack.extend(node.children.iter());
        }

        debug!(thread = %root.id, nodes = arena.len(), "thread ingested");
        Ok(Self {
            store,
            config,
            root: RootState {
                id: root.id,
                author_id: root.author_id,
                content: root.content,
                created_at: root.created_at,
                edited_at: None,
                like_count: root.like_count,
                dislike_count: root.dislike_count,
                reply_count: root.reply_count,
                is_locked: root.is_locked,
                is_pinned: root.is_pinned,
            },
            root_overlay: VoteOverlay::with_confirmed(root.own_vote),
            root_collapsed: false,
            arena,
            overlays,
            collapsed: HashSet::new(),
        })
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render using the session's configured defaults.
    pub fn render_default(&self) -> ThreadView {
        self.render(&self.config.render_params())
    }

    /// Render under explicit parameters. Pure with respect to session
    /// state; the same session can be rendered under two parameter sets
    /// without interference.
    pub fn render(&self, params: &RenderParams) -> ThreadView {
        let (like_count, dislike_count) = self
            .root_overlay
            .effective_counts(self.root.like_count, self.root.dislike_count);
        let root = RootView {
            id: self.root.id.clone(),
            author_id: self.root.author_id.clone(),
            content: self.root.content.clone(),
            created_at: self.root.created_at,
            edited_at: self.root.edited_at,
            like_count,
            dislike_count,
            own_vote: self.root_overlay.effective_direction(),
            vote_in_flight: self.root_overlay.in_flight(),
            reply_count: self.root.reply_count,
            is_locked: self.root.is_locked,
            is_pinned: self.root.is_pinned,
            collapsed: self.root_collapsed,
        };
        let nodes = if self.root_collapsed {
            Vec::new()
        } else {
            render_tree(&self.arena, &self.overlays, &self.collapsed, params)
        };
        ThreadView { root, nodes }
    }

    // ------------------------------------------------------------------
    // Vote intents
    // ------------------------------------------------------------------

    /// Register a vote intent on the root post or any reply, applying the
    /// optimistic overlay immediately.
    ///
    /// Synchronous: control returns to the caller as soon as the overlay is
    /// applied. A [`VoteDispatch::Cast`] or [`VoteDispatch::Retraction`]
    /// tells the caller which store request to dispatch; the eventual result
    /// is delivered back through [`resolve_vote`](Self::resolve_vote). A
    /// second intent while one is in flight on the same node resolves to
    /// [`VoteDispatch::Dropped`] and has no effect, now or later. Intents on
    /// different nodes are fully independent: any number may be in flight at
    /// once, and renders in between show the overlays and their in-flight
    /// flags.
    pub fn begin_vote(
        &mut self,
        target: &ReplyId,
        direction: VoteDirection,
    ) -> Result<VoteDispatch, ThreadError> {
        if self.root.is_locked {
            return Err(ValidationError::ThreadLocked.into());
        }
        let mut ctl = self
            .vote_controller(target)
            .ok_or_else(|| ValidationError::UnknownTarget(target.clone()))?;
        Ok(ctl.begin(direction))
    }

    /// Deliver the store's verdict for an in-flight vote on `target`.
    ///
    /// On success the authoritative counts replace local ones; on failure
    /// the overlay rolls back to its pre-intent value and the error is
    /// surfaced. Nothing is retried, and the failure never touches any
    /// other node.
    pub fn resolve_vote(
        &mut self,
        target: &ReplyId,
        result: Result<VoteReceipt, StoreError>,
    ) -> Result<(), ThreadError> {
        let mut ctl = self
            .vote_controller(target)
            .ok_or_else(|| ValidationError::UnknownTarget(target.clone()))?;
        if !ctl.in_flight() {
            debug_assert!(false, "resolve without in-flight vote on {target}");
            return Ok(());
        }
        match result {
            Ok(receipt) => {
                ctl.confirm(&receipt);
                self.prune_overlay(target);
                info!(target = %target, "vote confirmed");
                Ok(())
            }
            Err(err) => {
                ctl.rollback();
                self.prune_overlay(target);
                Err(err.into())
            }
        }
    }

    /// Cast a vote and drive it to resolution against the session's own
    /// store. Convenience composition of [`begin_vote`](Self::begin_vote)
    /// and [`resolve_vote`](Self::resolve_vote) for callers that want no
    /// interleaving.
    pub async fn cast_vote(
        &mut self,
        target: &ReplyId,
        direction: VoteDirection,
    ) -> Result<VoteDispatch, ThreadError> {
        let dispatch = self.begin_vote(target, direction)?;
        let result = match dispatch {
            VoteDispatch::Dropped => return Ok(dispatch),
            VoteDispatch::Cast(direction) => self.store.vote(target, direction).await,
            VoteDispatch::Retraction => self.store.retract_vote(target).await,
        };
        self.resolve_vote(target, result)?;
        Ok(dispatch)
    }

    fn vote_controller(&mut self, target: &ReplyId) -> Option<VoteController<'_>> {
        if *target == self.root.id {
            return Some(VoteController::new(
                &mut self.root_overlay,
                &mut self.root.like_count,
                &mut self.root.dislike_count,
            ));
        }
        let entry = self.arena.get_mut(target)?;
        let overlay = self.overlays.entry(target.clone()).or_default();
        Some(VoteController::new(
            overlay,
            &mut entry.like_count,
            &mut entry.dislike_count,
        ))
    }

    /// Drop overlay entries that carry no information anymore.
    fn prune_overlay(&mut self, target: &ReplyId) {
        if *target != self.root.id
            && self.overlays.get(target).is_some_and(VoteOverlay::is_clear)
        {
            self.overlays.remove(target);
        }
    }

    // ------------------------------------------------------------------
    // Content intents
    // ------------------------------------------------------------------

    /// Create a reply under `parent`, or to the root when `parent` is
    /// `None`. The node enters the tree only once the store confirms it.
    pub async fn reply(
        &mut self,
        parent: Option<&ReplyId>,
        author_id: &str,
        author: &str,
        content: &str,
    ) -> Result<ReplyId, ThreadError> {
        if self.root.is_locked {
            return Err(ValidationError::ThreadLocked.into());
        }
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        if let Some(parent) = parent
            && !self.arena.contains(parent)
        {
            return Err(ValidationError::UnknownTarget(parent.clone()).into());
        }

        let node = self.store.reply(parent, author_id, author, content).await?;
        let id = node.id.clone();
        self.arena.insert_child(parent, &node)?;
        self.root.reply_count += 1;
        info!(reply = %id, parent = ?parent, "reply confirmed");
        Ok(id)
    }

    /// Edit the root post or a reply. Author-only; permitted on locked
    /// threads. The tree changes only after the store confirms.
    pub async fn edit(
        &mut self,
        target: &ReplyId,
        editor_id: &str,
        content: &str,
    ) -> Result<(), ThreadError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }
        let author_id = if *target == self.root.id {
            self.root.author_id.as_str()
        } else {
            self.arena
                .get(target)
                .ok_or_else(|| ValidationError::UnknownTarget(target.clone()))?
                .author_id
                .as_str()
        };
        if author_id != editor_id {
            return Err(ValidationError::NotAuthor.into());
        }

        let receipt = self.store.edit(target, content).await?;
        if *target == self.root.id {
            self.root.content = receipt.content;
            self.root.edited_at = Some(receipt.edited_at);
        } else if let Some(entry) = self.arena.get_mut(target) {
            entry.content = receipt.content;
            entry.edited_at = Some(receipt.edited_at);
        }
        info!(target = %target, "edit confirmed");
        Ok(())
    }

    /// Delete a reply. Author-only; permitted on locked threads. The root
    /// post's lifecycle belongs to the page, not the thread session.
    ///
    /// On confirmation the node's materialized subtree leaves the arena
    /// (whatever the store's upstream orphan/cascade policy, those nodes are
    /// unreachable here). Returns the number of nodes removed locally.
    pub async fn delete(
        &mut self,
        target: &ReplyId,
        requester_id: &str,
    ) -> Result<u32, ThreadError> {
        let entry = self
            .arena
            .get(target)
            .ok_or_else(|| ValidationError::UnknownTarget(target.clone()))?;
        if entry.author_id != requester_id {
            return Err(ValidationError::NotAuthor.into());
        }

        self.store.delete(target).await?;
        let removed = self.arena.remove_subtree(target);
        for id in &removed {
            self.overlays.remove(id);
            self.collapsed.remove(id);
        }
        let removed = removed.len() as u32;
        self.root.reply_count = self.root.reply_count.saturating_sub(removed);
        info!(target = %target, removed, "delete confirmed");
        Ok(removed)
    }

    /// File a moderation report against the root post or a reply.
    pub async fn report(&mut self, target: &ReplyId, reason: &str) -> Result<(), ThreadError> {
        if reason.trim().is_empty() {
            return Err(ValidationError::EmptyReason.into());
        }
        if *target != self.root.id && !self.arena.contains(target) {
            return Err(ValidationError::UnknownTarget(target.clone()).into());
        }
        self.store.report(target, reason).await?;
        info!(target = %target, "report filed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accepted answer
    // ------------------------------------------------------------------

    /// Mark a reply as the accepted answer. Thread-author-only; at most one
    /// accepted reply per thread.
    pub async fn accept_reply(
        &mut self,
        target: &ReplyId,
        caller_id: &str,
    ) -> Result<(), ThreadError> {
        if caller_id != self.root.author_id {
            return Err(ValidationError::NotAuthor.into());
        }
        let entry = self
            .arena
            .get(target)
            .ok_or_else(|| ValidationError::UnknownTarget(target.clone()))?;
        if entry.is_accepted {
            return Ok(());
        }
        if let Some(existing) = self.arena.accepted() {
            return Err(ValidationError::AlreadyAccepted(existing.clone()).into());
        }

        self.store.set_accepted(target, true).await?;
        if let Some(entry) = self.arena.get_mut(target) {
            entry.is_accepted = true;
        }
        info!(target = %target, "reply accepted");
        Ok(())
    }

    /// Withdraw the accepted-answer mark. Thread-author-only; a no-op if
    /// the reply is not accepted.
    pub async fn unaccept_reply(
        &mut self,
        target: &ReplyId,
        caller_id: &str,
    ) -> Result<(), ThreadError> {
        if caller_id != self.root.author_id {
            return Err(ValidationError::NotAuthor.into());
        }
        let entry = self
            .arena
            .get(target)
            .ok_or_else(|| ValidationError::UnknownTarget(target.clone()))?;
        if !entry.is_accepted {
            return Ok(());
        }

        self.store.set_accepted(target, false).await?;
        if let Some(entry) = self.arena.get_mut(target) {
            entry.is_accepted = false;
        }
        info!(target = %target, "reply unaccepted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local-only state
    // ------------------------------------------------------------------

    /// Toggle collapse of the root post or a reply subtree. Local view
    /// state, never dispatched. Returns the new collapsed state.
    pub fn toggle_collapsed(&mut self, target: &ReplyId) -> Result<bool, ValidationError> {
        if *target == self.root.id {
            self.root_collapsed = !self.root_collapsed;
            return Ok(self.root_collapsed);
        }
        if !self.arena.contains(target) {
            return Err(ValidationError::UnknownTarget(target.clone()));
        }
        if self.collapsed.remove(target) {
            Ok(false)
        } else {
            self.collapsed.insert(target.clone());
            Ok(true)
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn is_locked(&self) -> bool {
        self.root.is_locked
    }

    /// Authoritative reply total (may exceed materialized nodes).
    pub fn reply_count(&self) -> u32 {
        self.root.reply_count
    }

    /// Materialized reply nodes.
    pub fn materialized_count(&self) -> usize {
        self.arena.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
