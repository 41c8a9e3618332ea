//! Sequential mutation context
//!
//! A [`MutationContext`] owns the current root of one file's tree. Every
//! successful edit resolves the path to the edited node, rebuilds its
//! ancestors into the context's own arena layer and swaps in the new root.
//! A failed edit leaves the root exactly as it was.

use super::edit::{self, Edit};
use super::forward::ForwardMap;
use super::guard::{ResourceGuard, ResourceLimits, ResourceStatistics};
use super::path::PathResolver;
use crate::ast::arena::NodeArena;
use crate::ast::{Comment, NodeData, NodeId, SyntaxTree, WhitespaceInfo};
use crate::config::MutationConfiguration;
use crate::overlay::ImmutableTreeView;
use crate::{Result, StylerError};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug)]
pub struct MutationContext {
    arena: Arc<NodeArena>,
    root: NodeId,
    guard: ResourceGuard,
    forward: ForwardMap,
}

impl MutationContext {
    /// Start editing `tree` with the default per-context limits
    pub fn new(tree: SyntaxTree) -> Self {
        Self::with_limits(tree, ResourceLimits::default())
    }

    pub fn with_config(tree: SyntaxTree, config: &MutationConfiguration) -> Self {
        Self::with_limits(tree, config.limits())
    }

    pub fn with_limits(tree: SyntaxTree, limits: ResourceLimits) -> Self {
        let arena = NodeArena::layered_on(Arc::clone(tree.arena()));
        debug!(
            "Creating mutation context on layer {} (max depth {}, max modifications {})",
            arena.layers(),
            limits.max_recursion_depth,
            limits.max_modifications
        );
        Self {
            arena: Arc::new(arena),
            root: tree.root(),
            guard: ResourceGuard::new(limits),
            forward: ForwardMap::default(),
        }
    }

    /// Continue sequentially on the tree a view wraps, with the view's
    /// per-overlay limits
    pub fn from_view(view: &ImmutableTreeView) -> Self {
        Self::with_limits(view.tree().clone(), view.overlay_limits())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Snapshot of the current generation
    pub fn tree(&self) -> SyntaxTree {
        SyntaxTree::from_parts(Arc::clone(&self.arena), self.root)
    }

    pub fn into_tree(self) -> SyntaxTree {
        SyntaxTree::from_parts(self.arena, self.root)
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.arena.node(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.get(id).map(NodeData::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.parent(id)
    }

    pub fn modification_count(&self) -> usize {
        self.guard.modification_count()
    }

    pub fn statistics(&self) -> ResourceStatistics {
        self.guard.statistics()
    }

    /// Allocate a node that is not yet part of the tree, typically the
    /// replacement passed to a later edit. Allocation is not a modification.
    ///
    /// Children must be current: a node an earlier edit replaced with a copy
    /// is rejected as stale.
    pub fn new_node(&mut self, data: NodeData) -> Result<NodeId> {
        if let Some(stale) = data
            .children()
            .iter()
            .find(|child| self.forward.is_superseded(**child))
        {
            return Err(StylerError::invalid_tree_state(format!(
                "{} references {stale}, which an earlier edit replaced with {}",
                data.stable_id(),
                self.forward.resolve(*stale)
            )));
        }
        let arena = Arc::make_mut(&mut self.arena);
        arena.check(&data)?;
        arena.push(data)
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> Result<()> {
        self.apply(Edit::Replace {
            parent,
            old_child,
            new_child,
        })
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        sibling: NodeId,
    ) -> Result<()> {
        let index = edit::sibling_index(&self.arena, parent, sibling, 0)?;
        self.apply(Edit::Insert {
            parent,
            index,
            new_child,
        })
    }

    pub fn insert_after(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        sibling: NodeId,
    ) -> Result<()> {
        let index = edit::sibling_index(&self.arena, parent, sibling, 1)?;
        self.apply(Edit::Insert {
            parent,
            index,
            new_child,
        })
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.apply(Edit::Remove { parent, child })
    }

    pub fn set_whitespace(&mut self, node: NodeId, whitespace: WhitespaceInfo) -> Result<()> {
        self.apply(Edit::SetWhitespace { node, whitespace })
    }

    /// Replace both comment lists of `node`
    pub fn set_comments(
        &mut self,
        node: NodeId,
        leading: Vec<Comment>,
        trailing: Vec<Comment>,
    ) -> Result<()> {
        self.apply(Edit::SetComments {
            node,
            leading,
            trailing,
        })
    }

    fn apply(&mut self, edit: Edit) -> Result<()> {
        let target = self.arena.node(edit.target())?.stable_id();
        let mut scope = self.guard.enter(Some(target.clone()))?;
        scope.ensure_modification_budget(Some(target.clone()))?;

        let resolver = PathResolver::new(scope.limits().max_recursion_depth);
        let arena = Arc::make_mut(&mut self.arena);
        let rebuilt = edit::apply(arena, self.root, &edit, &resolver, &self.forward)?;
        scope.commit_modification();
        drop(scope);

        self.forward.record(&rebuilt);
        self.root = rebuilt.root;
        trace!(
            "Applied {} to {} ({} ancestors rebuilt)",
            edit.operation(),
            target,
            rebuilt.copies.len()
        );
        Ok(())
    }
}
