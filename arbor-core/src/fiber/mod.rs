//! Fiber Tree
//!
//! Fibers mirror the element tree across renders. Two trees exist while a
//! render is in flight:
//!
//! - the **current** tree, last committed and visible through the host
//! - the **work-in-progress** tree, under construction
//!
//! Each work-in-progress fiber links to its counterpart in the current tree
//! through `alternate`, which is how hook state and host nodes carry over from
//! one render to the next.
//!
//! All fibers live in a [`FiberTree`] arena and refer to each other by
//! [`FiberId`].

mod node;
mod tree;

pub use node::{EffectTag, Fiber, FiberId, FiberKind};
pub use tree::FiberTree;
