//! Depth-bounded tree traversal producing the presentation-ready node list.
//!
//! The walk is an explicit stack with an integer depth counter, so the depth
//! bound is structural: work is O(maxDepth) levels no matter how deep the
//! actual tree is. Each level is sorted in isolation with the same strategy
//! value before its nodes are pushed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sort::{SortKey, SortStrategy, order_siblings};
use crate::state::{ReplyArena, ReplyId, VoteDirection, VoteOverlay};

/// Default recursion bound.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Per-invocation traversal parameters. Never global state: the same tree
/// can be rendered under two parameter sets concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    /// Nodes at this depth render but never recurse into children.
    pub max_depth: u32,
    pub strategy: SortStrategy,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strategy: SortStrategy::default(),
        }
    }
}

/// Visible body of a rendered node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderBody {
    Full {
        author: String,
        content: String,
        edited_at: Option<DateTime<Utc>>,
        is_accepted: bool,
    },
    /// Moderation-hidden: fixed-size placeholder, no content, no vote
    /// affordance. Children still render normally.
    HiddenPlaceholder,
}

/// One node of the flattened, depth-annotated render output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: ReplyId,
    pub depth: u32,
    /// Effective (overlay-adjusted) counts.
    pub like_count: u32,
    pub dislike_count: u32,
    /// The viewer's own direction as currently displayed.
    pub own_vote: Option<VoteDirection>,
    pub vote_in_flight: bool,
    pub body: RenderBody,
    pub child_count: usize,
    /// Children exist but the depth bound was reached: continue the thread
    /// out-of-band via this node's id.
    pub continue_thread: bool,
    /// Children exist but the viewer collapsed this subtree.
    pub collapsed: bool,
}

/// Walk the arena and emit nodes in display order.
pub(crate) fn render_tree(
    arena: &ReplyArena,
    overlays: &HashMap<ReplyId, VoteOverlay>,
    collapsed: &HashSet<ReplyId>,
    params: &RenderParams,
) -> Vec<RenderNode> {
    let mut out = Vec::with_capacity(arena.len());
    let mut stack: Vec<(ReplyId, u32)> = Vec::new();

    for id in sorted_level(arena.top_level(), arena, overlays, params.strategy)
        .into_iter()
        .rev()
    {
        stack.push((id, 0));
    }

    while let Some((id, depth)) = stack.pop() {
        let Some(entry) = arena.get(&id) else {
            debug_assert!(false, "stack referenced node missing from arena");
            continue;
        };
        let overlay = overlays.get(&id);
        let (like_count, dislike_count) = overlay
            .map(|o| o.effective_counts(entry.like_count, entry.dislike_count))
            .unwrap_or((entry.like_count, entry.dislike_count));

        let has_children = !entry.children.is_empty();
        let is_collapsed = has_children && collapsed.contains(&id);
        let is_truncated = has_children && !is_collapsed && depth >= params.max_depth;

        let body = if entry.is_hidden {
            RenderBody::HiddenPlaceholder
        } else {
            RenderBody::Full {
                author: entry.author.clone(),
                content: entry.content.clone(),
                edited_at: entry.edited_at,
                is_accepted: entry.is_accepted,
            }
        };

        out.push(RenderNode {
            id: id.clone(),
            depth,
            like_count,
            dislike_count,
            own_vote: overlay.and_then(|o| o.effective_direction()),
            vote_in_flight: overlay.is_some_and(|o| o.in_flight()),
            body,
            child_count: entry.children.len(),
            continue_thread: is_truncated,
            collapsed: is_collapsed,
        });

        if has_children && !is_collapsed && !is_truncated {
            for child in sorted_level(&entry.children, arena, overlays, params.strategy)
                .into_iter()
                .rev()
            {
                stack.push((child, depth + 1));
            }
        }
    }

    out
}

/// Sort one sibling level by effective counts.
fn sorted_level(
    ids: &[ReplyId],
    arena: &ReplyArena,
    overlays: &HashMap<ReplyId, VoteOverlay>,
    strategy: SortStrategy,
) -> Vec<ReplyId> {
    let keys = ids
        .iter()
        .filter_map(|id| arena.get(id))
        .map(|entry| {
            let (like_count, dislike_count) = overlays
                .get(&entry.id)
                .map(|o| o.effective_counts(entry.like_count, entry.dislike_count))
                .unwrap_or((entry.like_count, entry.dislike_count));
            SortKey {
                id: entry.id.clone(),
                created_at: entry.created_at,
                like_count,
                dislike_count,
            }
        })
        .collect();
    order_siblings(keys, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ReplyNode;
    use chrono::TimeZone;

    fn node(id: &str, minute: u32, likes: u32, children: Vec<ReplyNode>) -> ReplyNode {
        ReplyNode {
            id: ReplyId::from(id),
            author_id: "u1".into(),
            author: "ada".into(),
            content: format!("reply {id}"),
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, minute, 0).unwrap(),
            edited_at: None,
            like_count: likes,
            dislike_count: 0,
            is_hidden: false,
            is_accepted: false,
            own_vote: None,
            children,
        }
    }

    fn chain(depth: usize) -> ReplyNode {
        // a0 -> a1 -> ... -> a{depth}
        let mut current = node(&format!("a{depth}"), 0, 0, vec![]);
        for i in (0..depth).rev() {
            current = node(&format!("a{i}"), 0, 0, vec![current]);
        }
        current
    }

    fn render(
        tree: &[ReplyNode],
        collapsed: &[&str],
        params: RenderParams,
    ) -> Vec<RenderNode> {
        let arena = ReplyArena::from_tree(tree).unwrap();
        let overlays = HashMap::new();
        let collapsed: HashSet<ReplyId> = collapsed.iter().map(|s| ReplyId::from(*s)).collect();
        render_tree(&arena, &overlays, &collapsed, &params)
    }

    #[test]
    fn test_depth_bound_truncates_not_recurses() {
        let tree = vec![chain(10)];
        let params = RenderParams {
            max_depth: 3,
            ..Default::default()
        };
        let nodes = render(&tree, &[], params);

        assert!(nodes.iter().all(|n| n.depth <= 3));
        assert_eq!(nodes.len(), 4); // a0..a3
        let last = nodes.last().unwrap();
        assert_eq!(last.id, ReplyId::from("a3"));
        assert!(last.continue_thread);
        assert_eq!(last.child_count, 1);
        // Every other node is fully rendered.
        assert!(nodes[..3].iter().all(|n| !n.continue_thread));
    }

    #[test]
    fn test_leaf_at_max_depth_is_not_truncated() {
        let tree = vec![chain(3)];
        let params = RenderParams {
            max_depth: 3,
            ..Default::default()
        };
        let nodes = render(&tree, &[], params);
        assert!(!nodes.last().unwrap().continue_thread);
    }

    #[test]
    fn test_top_level_depth_is_zero() {
        let tree = vec![node("a", 0, 0, vec![node("b", 1, 0, vec![])])];
        let nodes = render(&tree, &[], RenderParams::default());
        assert_eq!(nodes[0].depth, 0);
        assert_eq!(nodes[1].depth, 1);
    }

    #[test]
    fn test_hidden_node_children_still_render() {
        let mut hidden = node("h", 0, 0, vec![node("c1", 1, 0, vec![]), node("c2", 2, 0, vec![])]);
        hidden.is_hidden = true;
        let nodes = render(&[hidden], &[], RenderParams::default());

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].body, RenderBody::HiddenPlaceholder);
        assert!(nodes[1..].iter().all(|n| matches!(n.body, RenderBody::Full { .. })));
    }

    #[test]
    fn test_collapsed_subtree_skipped() {
        let tree = vec![
            node("a", 2, 0, vec![node("b", 1, 0, vec![])]),
            node("x", 1, 0, vec![]),
        ];
        let nodes = render(&tree, &["a"], RenderParams::default());
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "x"]);
        assert!(nodes[0].collapsed);
        assert!(!nodes[0].continue_thread);
    }

    #[test]
    fn test_each_level_sorted_in_isolation() {
        // Top sort: parent "old" has a high-score child; siblings under
        // different parents must not interleave.
        let tree = vec![
            node("old", 1, 1, vec![node("inner-hot", 1, 50, vec![]), node("inner-cold", 2, 0, vec![])]),
            node("hot", 2, 10, vec![]),
        ];
        let params = RenderParams {
            max_depth: 5,
            strategy: SortStrategy::Top,
        };
        let nodes = render(&tree, &[], params);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["hot", "old", "inner-hot", "inner-cold"]);
    }

    #[test]
    fn test_overlay_adjusts_counts_and_order() {
        let arena = ReplyArena::from_tree(&[node("a", 0, 2, vec![]), node("b", 0, 3, vec![])])
            .unwrap();
        let mut overlays = HashMap::new();
        let mut overlay = VoteOverlay::default();
        overlay.begin(VoteDirection::Up);
        overlay.begin(VoteDirection::Up); // dropped, still one delta
        overlays.insert(ReplyId::from("a"), overlay);

        let params = RenderParams {
            max_depth: 5,
            strategy: SortStrategy::Top,
        };
        let nodes = render_tree(&arena, &overlays, &HashSet::new(), &params);
        // a's optimistic 3 ties b's 3; id tie-break puts a first.
        assert_eq!(nodes[0].id, ReplyId::from("a"));
        assert_eq!(nodes[0].like_count, 3);
        assert_eq!(nodes[0].own_vote, Some(VoteDirection::Up));
        assert!(nodes[0].vote_in_flight);
    }
}
