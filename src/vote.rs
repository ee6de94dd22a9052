//! Vote controller: glues a node's overlay to its authoritative counts.
//!
//! The overlay decides what happens ([`VoteOverlay::begin`]); the controller
//! applies the boundary's verdict to the counts. Confirmation replaces local
//! counts with the server's truth wholesale, so concurrent votes from other
//! users win over the local ±1 guess. Rollback touches only the overlay;
//! counts were never mutated optimistically, so they are already correct.

use tracing::{debug, warn};

use crate::state::{VoteDirection, VoteDispatch, VoteOverlay};
use crate::store::VoteReceipt;

/// Mutable view over one node's vote state for the duration of an intent.
pub struct VoteController<'a> {
    overlay: &'a mut VoteOverlay,
    like_count: &'a mut u32,
    dislike_count: &'a mut u32,
}

impl<'a> VoteController<'a> {
    pub fn new(
        overlay: &'a mut VoteOverlay,
        like_count: &'a mut u32,
        dislike_count: &'a mut u32,
    ) -> Self {
        Self {
            overlay,
            like_count,
            dislike_count,
        }
    }

    /// Register a vote intent. Dropped while in flight (backpressure, not an
    /// error).
    pub fn begin(&mut self, direction: VoteDirection) -> VoteDispatch {
        let dispatch = self.overlay.begin(direction);
        if dispatch == VoteDispatch::Dropped {
            debug!(?direction, "vote intent dropped, mutation in flight");
        }
        dispatch
    }

    /// Apply the boundary's confirmed counts and clear the in-flight state.
    pub fn confirm(&mut self, receipt: &VoteReceipt) {
        *self.like_count = receipt.like_count;
        *self.dislike_count = receipt.dislike_count;
        self.overlay.confirm();
    }

    /// Drop the optimistic delta after a boundary failure.
    pub fn rollback(&mut self) {
        warn!("vote mutation failed, rolling back overlay");
        self.overlay.rollback();
    }

    /// Displayed counts: authoritative plus the optimistic delta.
    pub fn effective_counts(&self) -> (u32, u32) {
        self.overlay
            .effective_counts(*self.like_count, *self.dislike_count)
    }

    pub fn in_flight(&self) -> bool {
        self.overlay.in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node {
        overlay: VoteOverlay,
        likes: u32,
        dislikes: u32,
    }

    impl Node {
        fn new(likes: u32, dislikes: u32) -> Self {
            Self {
                overlay: VoteOverlay::default(),
                likes,
                dislikes,
            }
        }

        fn controller(&mut self) -> VoteController<'_> {
            VoteController::new(&mut self.overlay, &mut self.likes, &mut self.dislikes)
        }
    }

    #[test]
    fn test_optimistic_then_rollback_restores_exact_counts() {
        let mut node = Node::new(3, 1);
        let mut ctl = node.controller();
        assert_eq!(ctl.begin(VoteDirection::Up), VoteDispatch::Cast(VoteDirection::Up));
        assert_eq!(ctl.effective_counts(), (4, 1));
        ctl.rollback();
        assert_eq!(ctl.effective_counts(), (3, 1));
        assert!(!ctl.in_flight());
    }

    #[test]
    fn test_confirm_takes_server_truth_over_local_guess() {
        let mut node = Node::new(3, 1);
        let mut ctl = node.controller();
        ctl.begin(VoteDirection::Up);
        // Server saw two other concurrent upvotes.
        ctl.confirm(&VoteReceipt {
            like_count: 6,
            dislike_count: 1,
        });
        assert_eq!(ctl.effective_counts(), (6, 1));
        assert!(!ctl.in_flight());
    }

    #[test]
    fn test_single_flight_guard_is_a_noop() {
        let mut node = Node::new(0, 0);
        let mut ctl = node.controller();
        ctl.begin(VoteDirection::Up);
        let counts_before = ctl.effective_counts();
        assert_eq!(ctl.begin(VoteDirection::Down), VoteDispatch::Dropped);
        assert_eq!(ctl.effective_counts(), counts_before);
        assert!(ctl.in_flight());
    }

    #[test]
    fn test_retraction_after_confirmed_vote() {
        let mut node = Node::new(3, 1);
        {
            let mut ctl = node.controller();
            ctl.begin(VoteDirection::Up);
            ctl.confirm(&VoteReceipt {
                like_count: 4,
                dislike_count: 1,
            });
        }
        let mut ctl = node.controller();
        assert_eq!(ctl.begin(VoteDirection::Up), VoteDispatch::Retraction);
        // Optimistically back to the pre-vote value.
        assert_eq!(ctl.effective_counts(), (3, 1));
        ctl.confirm(&VoteReceipt {
            like_count: 3,
            dislike_count: 1,
        });
        assert_eq!(ctl.effective_counts(), (3, 1));
    }
}
