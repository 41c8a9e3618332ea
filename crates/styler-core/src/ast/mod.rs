//! Syntax tree model
//!
//! Nodes are immutable values stored in a layered arena and referenced by
//! [`NodeId`]. A [`SyntaxTree`] is one frozen generation: a shared arena plus
//! a root. Editing never touches an existing slot; it appends rebuilt
//! ancestors to a new layer and leaves every untouched subtree shared with
//! the previous generation.

pub(crate) mod arena;
pub mod kind;
pub mod node;
pub mod tree;

pub use kind::{ChildShape, NodeKind};
pub use node::{
    Comment, CommentKind, FormattingHints, IndentationStyle, NodeData, NodeId, SourcePosition,
    SourceRange, StableNodeId, WhitespaceInfo,
};
pub use tree::{SyntaxTree, TreeBuilder};
