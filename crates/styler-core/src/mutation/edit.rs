//! Edit intents and how one edit becomes a new root
//!
//! An [`Edit`] names the node it rewrites and its operands. Turning it into a
//! new generation happens in two steps: [`plan`] validates the edit and
//! computes the target's new value without allocating, then the
//! [`AncestorRebuilder`] copies the path. A rejected plan leaves the arena
//! untouched.

use super::forward::ForwardMap;
use super::path::{PathResolver, TreePath};
use super::rebuild::{AncestorRebuilder, Rebuilt};
use crate::ast::arena::NodeArena;
use crate::ast::{Comment, NodeData, NodeId, WhitespaceInfo};
use crate::{Result, StylerError};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Kind of edit, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Replace,
    Insert,
    Remove,
    SetWhitespace,
    SetComments,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Replace => "replace",
            Operation::Insert => "insert",
            Operation::Remove => "remove",
            Operation::SetWhitespace => "set-whitespace",
            Operation::SetComments => "set-comments",
        };
        f.write_str(name)
    }
}

/// One edit with its operands.
///
/// Structural edits target the parent whose child list changes; metadata
/// edits target the node itself. Either way the target is the deepest node
/// that gets a new value, and everything above it is path-copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Swap `old_child` for `new_child` at the same position.
    ///
    /// `new_child` must not be attached anywhere else, although it may
    /// contain `old_child` or nodes below it. Replacing a child with itself
    /// still rebuilds the path.
    Replace {
        parent: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    },
    /// Put a detached `new_child` at `index`, which may equal the current
    /// child count
    Insert {
        parent: NodeId,
        index: usize,
        new_child: NodeId,
    },
    /// Drop `child` from `parent`. The child keeps its stale parent link and
    /// may be attached again by a later edit.
    Remove { parent: NodeId, child: NodeId },
    /// Replace the whitespace around `node`
    SetWhitespace {
        node: NodeId,
        whitespace: WhitespaceInfo,
    },
    /// Replace both comment lists of `node`
    SetComments {
        node: NodeId,
        leading: Vec<Comment>,
        trailing: Vec<Comment>,
    },
}

impl Edit {
    /// Payload-free kind of this edit
    pub fn operation(&self) -> Operation {
        match self {
            Edit::Replace { .. } => Operation::Replace,
            Edit::Insert { .. } => Operation::Insert,
            Edit::Remove { .. } => Operation::Remove,
            Edit::SetWhitespace { .. } => Operation::SetWhitespace,
            Edit::SetComments { .. } => Operation::SetComments,
        }
    }

    /// Node whose value the edit rewrites: the parent for structural
    /// edits, the node itself for metadata edits
    pub fn target(&self) -> NodeId {
        match self {
            Edit::Replace { parent, .. }
            | Edit::Insert { parent, .. }
            | Edit::Remove { parent, .. } => *parent,
            Edit::SetWhitespace { node, .. } | Edit::SetComments { node, .. } => *node,
        }
    }

    /// Child that leaves the tree, if any
    pub fn detached_child(&self) -> Option<NodeId> {
        match self {
            Edit::Replace {
                old_child,
                new_child,
                ..
            } if old_child != new_child => Some(*old_child),
            Edit::Remove { child, .. } => Some(*child),
            _ => None,
        }
    }

    /// Child that enters the tree, if any
    pub fn attached_child(&self) -> Option<NodeId> {
        match self {
            Edit::Replace { new_child, .. } | Edit::Insert { new_child, .. } => Some(*new_child),
            _ => None,
        }
    }

    /// Same edit with every node id passed through `translate`
    pub(crate) fn map_ids(&self, mut translate: impl FnMut(NodeId) -> NodeId) -> Edit {
        match self {
            Edit::Replace {
                parent,
                old_child,
                new_child,
            } => Edit::Replace {
                parent: translate(*parent),
                old_child: translate(*old_child),
                new_child: translate(*new_child),
            },
            Edit::Insert {
                parent,
                index,
                new_child,
            } => Edit::Insert {
                parent: translate(*parent),
                index: *index,
                new_child: translate(*new_child),
            },
            Edit::Remove { parent, child } => Edit::Remove {
                parent: translate(*parent),
                child: translate(*child),
            },
            Edit::SetWhitespace { node, whitespace } => Edit::SetWhitespace {
                node: translate(*node),
                whitespace: whitespace.clone(),
            },
            Edit::SetComments {
                node,
                leading,
                trailing,
            } => Edit::SetComments {
                node: translate(*node),
                leading: leading.clone(),
                trailing: trailing.clone(),
            },
        }
    }
}

fn not_a_child(arena: &NodeArena, parent: &NodeData, child: NodeId) -> StylerError {
    match arena.get(child) {
        Some(child_data) => StylerError::not_a_child(
            parent.stable_id(),
            child_data.stable_id(),
            parent.children().len(),
        ),
        None => StylerError::invalid_tree_state(format!(
            "node {child} does not exist in this tree"
        )),
    }
}

fn position(arena: &NodeArena, parent: &NodeData, child: NodeId) -> Result<usize> {
    parent
        .position_of(child)
        .ok_or_else(|| not_a_child(arena, parent, child))
}

/// A subtree entering the tree must exist, must be a tree, and no node in it
/// may already be attached in the current generation or belong to an older
/// one. `leaving` is the child the same edit detaches; the new subtree may
/// adopt it or anything below it.
fn ensure_detached(
    arena: &NodeArena,
    resolver: &PathResolver,
    forward: &ForwardMap,
    root: NodeId,
    node: NodeId,
    leaving: Option<NodeId>,
) -> Result<()> {
    let mut seen = HashSet::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        let data = arena.node(current)?;
        if !seen.insert(current) {
            return Err(StylerError::invalid_node(format!(
                "{} ({current}) is reachable more than once from the inserted subtree",
                data.stable_id()
            )));
        }
        if forward.is_superseded(current) {
            return Err(StylerError::invalid_tree_state(format!(
                "{} ({current}) belongs to an older generation; it was replaced by {}",
                data.stable_id(),
                forward.resolve(current)
            )));
        }
        if resolver.is_attached(arena, root, current, leaving) {
            return Err(StylerError::invalid_node(format!(
                "{} ({current}) is already attached to the tree",
                data.stable_id()
            )));
        }
        stack.extend_from_slice(data.children());
    }
    Ok(())
}

/// Validate `edit` against the generation rooted at `root` and compute the
/// path plus the new value of the edit's target. Nothing is allocated.
///
/// `forward` names the nodes earlier edits replaced with copies; none of
/// them may enter the tree again.
pub(crate) fn plan(
    arena: &NodeArena,
    root: NodeId,
    edit: &Edit,
    resolver: &PathResolver,
    forward: &ForwardMap,
) -> Result<(TreePath, NodeData)> {
    let path = resolver.resolve_in(arena, root, edit.target())?;
    let current = arena.node(edit.target())?;

    let replacement = match edit {
        Edit::Replace {
            old_child,
            new_child,
            ..
        } => {
            let index = position(arena, current, *old_child)?;
            if new_child != old_child {
                ensure_detached(
                    arena,
                    resolver,
                    forward,
                    root,
                    *new_child,
                    Some(*old_child),
                )?;
            }
            let mut data = current.clone();
            data.children_mut()[index] = *new_child;
            data
        }
        Edit::Insert {
            index, new_child, ..
        } => {
            let len = current.children().len();
            if *index > len {
                return Err(StylerError::invalid_node(format!(
                    "insertion index {index} is out of bounds for {} with {len} children",
                    current.stable_id()
                )));
            }
            ensure_detached(arena, resolver, forward, root, *new_child, None)?;
            let mut data = current.clone();
            data.children_mut().insert(*index, *new_child);
            data
        }
        Edit::Remove { child, .. } => {
            let index = position(arena, current, *child)?;
            let mut data = current.clone();
            data.children_mut().remove(index);
            data
        }
        Edit::SetWhitespace { whitespace, .. } => {
            current.clone().with_whitespace(whitespace.clone())
        }
        Edit::SetComments {
            leading, trailing, ..
        } => current
            .clone()
            .with_leading_comments(leading.clone())
            .with_trailing_comments(trailing.clone()),
    };
    replacement.validate()?;
    Ok((path, replacement))
}

/// Plan and rebuild in one step
pub(crate) fn apply(
    arena: &mut NodeArena,
    root: NodeId,
    edit: &Edit,
    resolver: &PathResolver,
    forward: &ForwardMap,
) -> Result<Rebuilt> {
    let (path, replacement) = plan(arena, root, edit, resolver, forward)?;
    AncestorRebuilder::rebuild(arena, &path, replacement)
}

/// Index of `sibling` in `parent`, shifted by `offset` (0 = before,
/// 1 = after)
pub(crate) fn sibling_index(
    arena: &NodeArena,
    parent: NodeId,
    sibling: NodeId,
    offset: usize,
) -> Result<usize> {
    let parent_data = arena.node(parent)?;
    Ok(position(arena, parent_data, sibling)? + offset)
}
