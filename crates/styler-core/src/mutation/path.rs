//! Path-to-root resolution
//!
//! ## Algorithm
//!
//! 1. Start at the target and follow parent links upward, collecting ids
//! 2. Stop when a node has no parent, or fail once `max_depth` links were
//!    followed (this also terminates on a corrupt, cyclic chain)
//! 3. The last node reached must be the expected root; otherwise the target
//!    belongs to an older generation and is stale
//! 4. Reverse the collected ids into `[root, ..., target]`

use crate::ast::arena::NodeArena;
use crate::ast::{NodeId, SyntaxTree};
use crate::mutation::LimitedResource;
use crate::{Result, StylerError};
use tracing::trace;

/// Root-to-target chain of genuine parent/child links, both ends included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePath {
    nodes: Vec<NodeId>,
}

impl TreePath {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn root(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn target(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Parent of the target, `None` when the target is the root
    pub fn parent_of_target(&self) -> Option<NodeId> {
        self.nodes.len().checked_sub(2).map(|index| self.nodes[index])
    }

    /// Number of nodes on the path
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// Resolves the ancestor chain of a node
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    max_depth: usize,
}

impl PathResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Resolve `target` against the root of `tree`
    pub fn resolve(&self, tree: &SyntaxTree, target: NodeId) -> Result<TreePath> {
        self.resolve_in(tree.arena(), tree.root(), target)
    }

    pub(crate) fn resolve_in(
        &self,
        arena: &NodeArena,
        root: NodeId,
        target: NodeId,
    ) -> Result<TreePath> {
        let target_data = arena.node(target)?;
        let mut nodes = vec![target];
        let mut current = target;
        while let Some(parent) = arena.parent(current) {
            if nodes.len() >= self.max_depth {
                return Err(StylerError::resource_limit(
                    LimitedResource::RecursionDepth,
                    nodes.len() + 1,
                    self.max_depth,
                    Some(target_data.stable_id()),
                ));
            }
            nodes.push(parent);
            current = parent;
        }

        if current != root {
            let reached = arena
                .get(current)
                .map(|data| data.stable_id().to_string())
                .unwrap_or_else(|| current.to_string());
            let expected = arena
                .get(root)
                .map(|data| data.stable_id().to_string())
                .unwrap_or_else(|| root.to_string());
            return Err(StylerError::invalid_tree_state(format!(
                "{} is not reachable from the current root {expected}; its ancestors end at {reached}",
                target_data.stable_id()
            )));
        }

        nodes.reverse();
        trace!(
            "Resolved path of length {} to {}",
            nodes.len(),
            target_data.stable_id()
        );
        Ok(TreePath { nodes })
    }

    /// Whether `node` is currently reachable from `root`, at any depth.
    ///
    /// A chain that passes through `except` does not count: that node is
    /// about to leave the tree, so its descendants may be adopted.
    pub(crate) fn is_attached(
        &self,
        arena: &NodeArena,
        root: NodeId,
        node: NodeId,
        except: Option<NodeId>,
    ) -> bool {
        let mut current = node;
        for _ in 0..arena.len() {
            if Some(current) == except {
                return false;
            }
            match arena.parent(current) {
                Some(parent) => current = parent,
                None => return current == root && arena.contains(node),
            }
        }
        false
    }
}
