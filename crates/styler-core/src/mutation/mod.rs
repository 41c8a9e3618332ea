//! Mutation engine for immutable trees
//!
//! Edits never change an existing node. The [`PathResolver`] finds the
//! chain from the root to the node being rewritten, the
//! [`AncestorRebuilder`] copies that chain bottom-up with the new value at
//! its tail, and the caller adopts the copied root. Everything off the chain
//! stays shared with the previous generation.

pub mod context;
pub mod edit;
pub(crate) mod forward;
pub mod guard;
pub mod path;
pub mod rebuild;

pub use context::MutationContext;
pub use edit::{Edit, Operation};
pub use guard::{
    DepthScope, LimitedResource, ResourceGuard, ResourceLimits, ResourceStatistics,
    SharedResourceGuard,
};
pub use path::{PathResolver, TreePath};
pub use rebuild::{AncestorRebuilder, Rebuilt};
