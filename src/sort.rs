//! Sibling ordering strategies.
//!
//! Sorting is applied independently at every tree level: siblings under
//! different parents never interleave, and the same strategy value is reused
//! for every level of one traversal pass. Scores are computed from effective
//! (overlay-adjusted) counts, so an optimistic vote reorders immediately.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::{controversial_score, net_score};
use crate::state::{ReplyId, ReplyNode};

/// How sibling replies are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    /// Descending by creation time.
    #[default]
    Newest,
    /// Descending by net score.
    Top,
    /// Descending by controversy score.
    Controversial,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Top => "top",
            Self::Controversial => "controversial",
        }
    }
}

impl std::fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "top" => Ok(Self::Top),
            "controversial" => Ok(Self::Controversial),
            other => Err(format!("unknown sort strategy: {other}")),
        }
    }
}

/// Everything the sort engine needs to know about one sibling.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub id: ReplyId,
    pub created_at: DateTime<Utc>,
    /// Effective (overlay-adjusted) counts.
    pub like_count: u32,
    pub dislike_count: u32,
}

/// Order one sibling level, returning ids in display order.
///
/// Deterministic: ties break by id ascending, so repeated calls on the same
/// input yield an identical ordering. The input is consumed but nothing
/// outside it is touched.
pub fn order_siblings(mut keys: Vec<SortKey>, strategy: SortStrategy) -> Vec<ReplyId> {
    match strategy {
        SortStrategy::Newest => keys.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortStrategy::Top => keys.sort_by(|a, b| {
            net_score(b.like_count, b.dislike_count)
                .cmp(&net_score(a.like_count, a.dislike_count))
                .then_with(|| a.id.cmp(&b.id))
        }),
        SortStrategy::Controversial => keys.sort_by(|a, b| {
            controversial_score(b.like_count, b.dislike_count)
                .total_cmp(&controversial_score(a.like_count, a.dislike_count))
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
    keys.into_iter().map(|k| k.id).collect()
}

/// Order a raw sibling slice from the boundary shape, non-mutating.
///
/// Convenience for callers holding a nested [`ReplyNode`] list; the session
/// itself sorts arena levels through [`order_siblings`] with effective
/// counts.
pub fn sort_replies(nodes: &[ReplyNode], strategy: SortStrategy) -> Vec<ReplyId> {
    let keys = nodes
        .iter()
        .map(|n| SortKey {
            id: n.id.clone(),
            created_at: n.created_at,
            like_count: n.like_count,
            dislike_count: n.dislike_count,
        })
        .collect();
    order_siblings(keys, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(id: &str, minute: u32, likes: u32, dislikes: u32) -> SortKey {
        SortKey {
            id: ReplyId::from(id),
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, minute, 0).unwrap(),
            like_count: likes,
            dislike_count: dislikes,
        }
    }

    fn ids(v: &[&str]) -> Vec<ReplyId> {
        v.iter().map(|s| ReplyId::from(*s)).collect()
    }

    #[test]
    fn test_newest_descends_by_created_at() {
        let keys = vec![key("a", 1, 0, 0), key("b", 3, 0, 0), key("c", 2, 0, 0)];
        assert_eq!(order_siblings(keys, SortStrategy::Newest), ids(&["b", "c", "a"]));
    }

    #[test]
    fn test_top_descends_by_net_score() {
        let keys = vec![key("a", 0, 2, 5), key("b", 0, 9, 1), key("c", 0, 4, 0)];
        assert_eq!(order_siblings(keys, SortStrategy::Top), ids(&["b", "c", "a"]));
    }

    #[test]
    fn test_controversial_favors_even_high_volume() {
        let keys = vec![key("a", 0, 10, 1), key("b", 0, 10, 10), key("c", 0, 0, 0)];
        assert_eq!(
            order_siblings(keys, SortStrategy::Controversial),
            ids(&["b", "a", "c"])
        );
    }

    #[test]
    fn test_ties_break_by_id_ascending() {
        let keys = vec![key("z", 5, 3, 1), key("a", 5, 3, 1), key("m", 5, 3, 1)];
        for strategy in [SortStrategy::Newest, SortStrategy::Top, SortStrategy::Controversial] {
            assert_eq!(order_siblings(keys.clone(), strategy), ids(&["a", "m", "z"]));
        }
    }

    #[test]
    fn test_sort_is_deterministic_and_idempotent() {
        let keys = vec![key("d", 2, 1, 1), key("a", 2, 4, 0), key("c", 7, 0, 3), key("b", 1, 4, 0)];
        for strategy in [SortStrategy::Newest, SortStrategy::Top, SortStrategy::Controversial] {
            let first = order_siblings(keys.clone(), strategy);
            let second = order_siblings(keys.clone(), strategy);
            assert_eq!(first, second);

            // Re-sorting an already sorted list changes nothing.
            let resorted_keys: Vec<SortKey> = first
                .iter()
                .map(|id| keys.iter().find(|k| &k.id == id).unwrap().clone())
                .collect();
            assert_eq!(order_siblings(resorted_keys, strategy), first);
        }
    }

    #[test]
    fn test_sort_replies_orders_boundary_slice_without_mutating() {
        use crate::state::ReplyNode;

        let node = |id: &str, minute: u32, likes: u32| ReplyNode {
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
            children: Vec::new(),
        };
        let nodes = vec![node("a", 1, 2), node("b", 3, 9), node("c", 2, 4)];

        assert_eq!(sort_replies(&nodes, SortStrategy::Newest), ids(&["b", "c", "a"]));
        assert_eq!(sort_replies(&nodes, SortStrategy::Top), ids(&["b", "c", "a"]));
        // The slice itself is untouched.
        assert_eq!(nodes[0].id, ReplyId::from("a"));
    }

    #[test]
    fn test_strategy_round_trips_from_str() {
        for strategy in [SortStrategy::Newest, SortStrategy::Top, SortStrategy::Controversial] {
            assert_eq!(strategy.as_str().parse::<SortStrategy>().unwrap(), strategy);
        }
        assert!("hot".parse::<SortStrategy>().is_err());
    }
}
