//! Per-node optimistic vote state machine.
//!
//! ```text
//! ┌──────┐  begin(dir)   ┌─────────────┐  confirm   ┌──────┐
//! │ Idle ├──────────────►│ Casting(d) /├───────────►│ Idle │ (confirmed = result)
//! └──────┘               │ Retracting  │  fail      └──────┘
//!                        └─────────────┘──────────► Idle (confirmed unchanged)
//! ```
//!
//! At most one mutation is in flight per node; a `begin` while in flight is
//! dropped, not queued. Rollback is nothing more than returning to `Idle`
//! with `confirmed` untouched, so the displayed counts snap back to the last
//! authoritative values by construction.

use serde::{Deserialize, Serialize};

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// What a vote intent resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDispatch {
    /// Another mutation is in flight; the intent was dropped, not queued.
    Dropped,
    /// Dispatch a vote in this direction.
    Cast(VoteDirection),
    /// Same direction re-voted: dispatch a retraction.
    Retraction,
}

/// In-flight phase of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Casting(VoteDirection),
    Retracting,
}

/// Optimistic vote overlay for a single node.
///
/// `confirmed` is the caller's last server-acknowledged direction; the
/// authoritative counts already include it. The optimistic delta displayed
/// to the user is the difference between the in-flight target direction and
/// `confirmed`, so both buckets can shift in one Up→Down switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteOverlay {
    confirmed: Option<VoteDirection>,
    phase: Phase,
}

impl VoteOverlay {
    /// Restore a previously confirmed direction (e.g. thread reload where
    /// the boundary reports the caller's own vote).
    pub fn with_confirmed(direction: Option<VoteDirection>) -> Self {
        Self {
            confirmed: direction,
            phase: Phase::Idle,
        }
    }

    /// True while a vote or retraction is awaiting the boundary.
    #[inline]
    pub fn in_flight(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// The caller's last confirmed direction.
    #[inline]
    pub fn confirmed(&self) -> Option<VoteDirection> {
        self.confirmed
    }

    /// The direction currently reflected in displayed counts.
    #[inline]
    pub fn effective_direction(&self) -> Option<VoteDirection> {
        match self.phase {
            Phase::Casting(d) => Some(d),
            Phase::Retracting => None,
            Phase::Idle => self.confirmed,
        }
    }

    /// An overlay with nothing pending and nothing confirmed carries no
    /// information and can be dropped from the overlay map.
    #[inline]
    pub fn is_clear(&self) -> bool {
        self.phase == Phase::Idle && self.confirmed.is_none()
    }

    /// Register a vote intent.
    ///
    /// Dropped while in flight; a repeat of the confirmed direction becomes
    /// a retraction; anything else becomes an optimistic cast (switching
    /// Up↔Down in one step included).
    pub fn begin(&mut self, direction: VoteDirection) -> VoteDispatch {
        if self.in_flight() {
            return VoteDispatch::Dropped;
        }
        if self.confirmed == Some(direction) {
            self.phase = Phase::Retracting;
            VoteDispatch::Retraction
        } else {
            self.phase = Phase::Casting(direction);
            VoteDispatch::Cast(direction)
        }
    }

    /// The boundary confirmed the in-flight mutation: the target direction
    /// becomes the confirmed one and the overlay returns to idle. The
    /// caller replaces counts with the authoritative values from the
    /// response.
    pub fn confirm(&mut self) {
        debug_assert!(self.in_flight(), "confirm without in-flight mutation");
        self.confirmed = match self.phase {
            Phase::Casting(d) => Some(d),
            Phase::Retracting => None,
            Phase::Idle => self.confirmed,
        };
        self.phase = Phase::Idle;
    }

    /// The boundary failed: drop the optimistic delta, keep `confirmed` as
    /// it was before the intent.
    pub fn rollback(&mut self) {
        debug_assert!(self.in_flight(), "rollback without in-flight mutation");
        self.phase = Phase::Idle;
    }

    /// Authoritative counts adjusted by the optimistic delta (at most ±1
    /// per bucket).
    pub fn effective_counts(&self, likes: u32, dislikes: u32) -> (u32, u32) {
        let effective = self.effective_direction();
        if effective == self.confirmed {
            return (likes, dislikes);
        }
        let (mut likes, mut dislikes) = (likes, dislikes);
        match self.confirmed {
            Some(VoteDirection::Up) => likes = likes.saturating_sub(1),
            Some(VoteDirection::Down) => dislikes = dislikes.saturating_sub(1),
            None => {}
        }
        match effective {
            Some(VoteDirection::Up) => likes += 1,
            Some(VoteDirection::Down) => dislikes += 1,
            None => {}
        }
        (likes, dislikes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_applies_optimistic_delta() {
        let mut overlay = VoteOverlay::default();
        assert_eq!(overlay.begin(VoteDirection::Up), VoteDispatch::Cast(VoteDirection::Up));
        assert!(overlay.in_flight());
        assert_eq!(overlay.effective_counts(3, 1), (4, 1));
    }

    #[test]
    fn test_second_intent_dropped_and_never_replays() {
        let mut overlay = VoteOverlay::default();
        overlay.begin(VoteDirection::Up);
        let before = overlay.clone();
        assert_eq!(overlay.begin(VoteDirection::Down), VoteDispatch::Dropped);
        assert_eq!(overlay, before);

        // The dropped intent leaves no trace after the first resolves.
        overlay.confirm();
        assert_eq!(overlay.confirmed(), Some(VoteDirection::Up));
        assert!(!overlay.in_flight());
    }

    #[test]
    fn test_rollback_restores_pre_intent_state() {
        let mut overlay = VoteOverlay::default();
        overlay.begin(VoteDirection::Up);
        assert_eq!(overlay.effective_counts(3, 1), (4, 1));
        overlay.rollback();
        assert_eq!(overlay.effective_counts(3, 1), (3, 1));
        assert_eq!(overlay.confirmed(), None);
        assert!(overlay.is_clear());
    }

    #[test]
    fn test_rollback_keeps_previous_direction() {
        let mut overlay = VoteOverlay::with_confirmed(Some(VoteDirection::Up));
        overlay.begin(VoteDirection::Down);
        overlay.rollback();
        assert_eq!(overlay.confirmed(), Some(VoteDirection::Up));
        assert_eq!(overlay.effective_counts(4, 1), (4, 1));
    }

    #[test]
    fn test_same_direction_is_retraction() {
        let mut overlay = VoteOverlay::with_confirmed(Some(VoteDirection::Up));
        // Authoritative (4,1) already includes the confirmed Up.
        assert_eq!(overlay.begin(VoteDirection::Up), VoteDispatch::Retraction);
        assert_eq!(overlay.effective_counts(4, 1), (3, 1));
        overlay.confirm();
        assert_eq!(overlay.confirmed(), None);
        assert!(overlay.is_clear());
    }

    #[test]
    fn test_switch_direction_shifts_both_buckets() {
        let mut overlay = VoteOverlay::with_confirmed(Some(VoteDirection::Up));
        assert_eq!(overlay.begin(VoteDirection::Down), VoteDispatch::Cast(VoteDirection::Down));
        assert_eq!(overlay.effective_counts(4, 1), (3, 2));
    }

    #[test]
    fn test_effective_counts_saturate_at_zero() {
        // Confirmed direction with a zero bucket: stale counts must not
        // underflow.
        let mut overlay = VoteOverlay::with_confirmed(Some(VoteDirection::Up));
        overlay.begin(VoteDirection::Up);
        assert_eq!(overlay.effective_counts(0, 0), (0, 0));
    }
}
