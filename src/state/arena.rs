//! Flat id-keyed arena for the materialized reply tree.
//!
//! Nodes are stored in a map keyed by id with explicit parent links and
//! child-id lists, instead of embedding mutable state in a nested tree.
//! Rebuilding the arena from boundary input is the checked ingest point: a
//! node reachable from two parents shows up as a duplicate id here, and that
//! is rejected as a [`StructuralViolation`] rather than silently producing a
//! corrupt tree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::StructuralViolation;
use crate::state::node::{ReplyId, ReplyNode};

/// One materialized reply, flattened out of the boundary tree.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub id: ReplyId,
    pub author_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub like_count: u32,
    pub dislike_count: u32,
    pub is_hidden: bool,
    pub is_accepted: bool,
    pub parent: Option<ReplyId>,
    pub children: Vec<ReplyId>,
}

/// Flat storage for all replies of one thread.
#[derive(Debug, Clone, Default)]
pub struct ReplyArena {
    entries: HashMap<ReplyId, NodeEntry>,
    top_level: Vec<ReplyId>,
}

impl ReplyArena {
    /// Build an arena from the boundary's nested reply list.
    ///
    /// Fails with [`StructuralViolation::DuplicateId`] if any id appears
    /// twice; owned nesting cannot express a cycle, so duplicate detection
    /// is the whole tree-ness check.
    pub fn from_tree(replies: &[ReplyNode]) -> Result<Self, StructuralViolation> {
        let mut arena = Self::default();
        for node in replies {
            arena.insert_subtree(node, None)?;
        }
        Ok(arena)
    }

    fn insert_subtree(
        &mut self,
        node: &ReplyNode,
        parent: Option<ReplyId>,
    ) -> Result<(), StructuralViolation> {
        self.attach(node, parent.clone())?;
        for child in &node.children {
            self.insert_subtree(child, Some(node.id.clone()))?;
        }
        Ok(())
    }

    fn attach(
        &mut self,
        node: &ReplyNode,
        parent: Option<ReplyId>,
    ) -> Result<(), StructuralViolation> {
        if self.entries.contains_key(&node.id) {
            return Err(StructuralViolation::DuplicateId(node.id.clone()));
        }
        let entry = NodeEntry {
            id: node.id.clone(),
            author_id: node.author_id.clone(),
            author: node.author.clone(),
            content: node.content.clone(),
            created_at: node.created_at,
            edited_at: node.edited_at,
            like_count: node.like_count,
            dislike_count: node.dislike_count,
            is_hidden: node.is_hidden,
            is_accepted: node.is_accepted,
            parent: parent.clone(),
            children: Vec::new(),
        };
        match parent {
            Some(ref pid) => {
                let parent_entry = self
                    .entries
                    .get_mut(pid)
                    .expect("parent inserted before child");
                parent_entry.children.push(node.id.clone());
            }
            None => self.top_level.push(node.id.clone()),
        }
        self.entries.insert(node.id.clone(), entry);
        Ok(())
    }

    /// Insert a boundary-confirmed node (and any children it came with)
    /// under `parent`, or at top level when `parent` is `None`.
    pub fn insert_child(
        &mut self,
        parent: Option<&ReplyId>,
        node: &ReplyNode,
    ) -> Result<(), StructuralViolation> {
        debug_assert!(
            parent.is_none_or(|p| self.entries.contains_key(p)),
            "insert under unknown parent"
        );
        self.insert_subtree(node, parent.cloned())
    }

    /// Remove a node and its entire materialized subtree.
    ///
    /// Returns the ids removed (empty if the id is unknown) so callers can
    /// purge per-node state keyed by them.
    pub fn remove_subtree(&mut self, id: &ReplyId) -> Vec<ReplyId> {
        let Some(entry) = self.entries.remove(id) else {
            return Vec::new();
        };
        match entry.parent {
            Some(ref pid) => {
                if let Some(parent) = self.entries.get_mut(pid) {
                    parent.children.retain(|c| c != id);
                }
            }
            None => self.top_level.retain(|c| c != id),
        }
        let mut removed = vec![entry.id];
        let mut stack = entry.children;
        while let Some(next) = stack.pop() {
            if let Some(child) = self.entries.remove(&next) {
                stack.extend(child.children);
                removed.push(child.id);
            }
        }
        removed
    }

    pub fn get(&self, id: &ReplyId) -> Option<&NodeEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &ReplyId) -> Option<&mut NodeEntry> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &ReplyId) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids of the top-level replies (depth 0), in insertion order.
    pub fn top_level(&self) -> &[ReplyId] {
        &self.top_level
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id of the currently accepted reply, if any.
    pub fn accepted(&self) -> Option<&ReplyId> {
        self.entries.values().find(|e| e.is_accepted).map(|e| &e.id)
    }

    /// Clear the accepted mark everywhere.
    pub fn clear_accepted(&mut self) {
        for entry in self.entries.values_mut() {
            entry.is_accepted = false;
        }
    }
}
