//! Pure scoring functions for reply ranking.

/// Net score: likes minus dislikes.
#[inline]
pub fn net_score(likes: u32, dislikes: u32) -> i64 {
    i64::from(likes) - i64::from(dislikes)
}

/// Controversy score: `total * (min / max)`, always >= 0.
///
/// A reply with many votes split near 50/50 outranks one with few votes or
/// a lopsided split. The `max(.., 1)` guard makes the zero-vote case score 0
/// instead of dividing by zero.
#[inline]
pub fn controversial_score(likes: u32, dislikes: u32) -> f64 {
    let total = u64::from(likes) + u64::from(dislikes);
    let min = f64::from(likes.min(dislikes));
    let max = f64::from(likes.max(dislikes).max(1));
    total as f64 * (min / max)
}
