//! braid — a threaded discussion engine.
//!
//! Core of a nested-reply view: a flat arena holding the reply tree,
//! deterministic per-level sorting (newest / top / controversial),
//! an optimistic per-node vote state machine with single-flight guard and
//! rollback, and a depth-bounded traversal that emits a presentation-ready
//! node list. The persistence service sits behind the [`ReplyStore`] trait;
//! painting the output is the presentation layer's job.
//!
//! ```no_run
//! use braid::{MemoryStore, RenderParams, SortStrategy, ThreadSession};
//! # fn thread_from_somewhere() -> braid::ThreadRoot { unimplemented!() }
//!
//! # fn main() -> Result<(), braid::ThreadError> {
//! let root = thread_from_somewhere();
//! let store = MemoryStore::seed_thread(&root);
//! let session = ThreadSession::new(root, store)?;
//! let view = session.render(&RenderParams {
//!     max_depth: 5,
//!     strategy: SortStrategy::Top,
//! });
//! for node in &view.nodes {
//!     println!("{}{}", "  ".repeat(node.depth as usize), node.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod render;
pub mod score;
pub mod session;
pub mod sort;
pub mod state;
pub mod store;
pub mod vote;

pub use config::{ConfigError, EngineConfig};
pub use error::{StoreError, StructuralViolation, ThreadError, ValidationError};
pub use render::{DEFAULT_MAX_DEPTH, RenderBody, RenderNode, RenderParams};
pub use session::{RootView, ThreadSession, ThreadView};
pub use sort::{SortKey, SortStrategy, order_siblings, sort_replies};
pub use state::{ReplyId, ReplyNode, ThreadRoot, VoteDirection, VoteDispatch, VoteOverlay};
pub use store::{EditReceipt, MemoryStore, ReplyStore, VoteReceipt};
