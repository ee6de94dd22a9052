//! In-memory thread state: boundary types, the flat reply arena, and the
//! per-node vote overlay.

pub mod arena;
pub mod node;
pub mod overlay;

pub use arena::{NodeEntry, ReplyArena};
pub use node::{ReplyId, ReplyNode, ThreadRoot};
pub use overlay::{VoteDirection, VoteDispatch, VoteOverlay};
