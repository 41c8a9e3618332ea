//! Styler Core
//!
//! Immutable syntax tree mutation engine for the styler Java formatter.
//! Formatting rules rewrite small parts of a file's tree without copying the
//! whole tree, either sequentially through a [`MutationContext`] or in
//! parallel through per-worker [`Overlay`]s that a [`Reconciler`] merges.
//!
//! ```
//! use styler_core::ast::{NodeData, NodeKind, SourceRange, TreeBuilder};
//! use styler_core::MutationContext;
//!
//! let mut builder = TreeBuilder::new();
//! let name = builder.alloc(
//!     NodeData::new(NodeKind::Identifier, SourceRange::from_coords(1, 7, 1, 10)).with_text("Foo"),
//! )?;
//! let class = builder.alloc(
//!     NodeData::new(NodeKind::ClassDeclaration, SourceRange::from_coords(1, 1, 1, 13))
//!         .with_children([name]),
//! )?;
//! let tree = builder.finish(class)?;
//!
//! let mut ctx = MutationContext::new(tree.clone());
//! let renamed = ctx.new_node(
//!     NodeData::new(NodeKind::Identifier, SourceRange::from_coords(1, 7, 1, 10)).with_text("Bar"),
//! )?;
//! ctx.replace_child(class, name, renamed)?;
//!
//! let edited = ctx.into_tree();
//! assert_ne!(edited.root(), tree.root());
//! assert_eq!(tree.children(tree.root()), &[name]);
//! # Ok::<(), styler_core::StylerError>(())
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod mutation;
pub mod overlay;
pub mod result;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use ast::{
    ChildShape, Comment, CommentKind, FormattingHints, IndentationStyle, NodeData, NodeId,
    NodeKind, SourcePosition, SourceRange, StableNodeId, SyntaxTree, TreeBuilder, WhitespaceInfo,
};
pub use config::{BatchLimits, BlockLimits, ConfigLoader, MutationConfiguration};
pub use error::{ErrorKind, StylerError};
pub use mutation::{
    AncestorRebuilder, Edit, LimitedResource, MutationContext, Operation, PathResolver,
    ResourceGuard, ResourceLimits, ResourceStatistics, SharedResourceGuard, TreePath,
};
pub use overlay::{
    Conflict, ConflictDetector, ConflictReason, ImmutableTreeView, MergeOutcome, MergeRejection,
    MergeStatistics, ModificationRecord, Overlay, OverlayState, Reconciler, SealedOverlay,
    WorkerId, edit_blocks,
};
pub use result::{Result, ResultExt};

/// Initialize the tracing subscriber for logging.
///
/// Honors `RUST_LOG`; defaults to `styler_core=info`. Calling it again after
/// a subscriber is installed has no effect.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("styler_core=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
