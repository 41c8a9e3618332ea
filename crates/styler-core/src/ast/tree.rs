//! Frozen tree generations and read-only navigation

use super::arena::NodeArena;
use super::kind::NodeKind;
use super::node::{NodeData, NodeId, SourceRange, StableNodeId};
use crate::{Result, StylerError};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Write;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// One immutable generation of a syntax tree.
///
/// Cloning is cheap: the arena is shared, and so are all nodes a later
/// generation did not rebuild.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    arena: Arc<NodeArena>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn from_parts(arena: Arc<NodeArena>, root: NodeId) -> Self {
        Self { arena, root }
    }

    pub(crate) fn arena(&self) -> &Arc<NodeArena> {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.arena.get(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.arena.node(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(NodeData::kind)
    }

    pub fn range(&self, id: NodeId) -> Option<SourceRange> {
        self.get(id).map(NodeData::range)
    }

    pub fn stable_id(&self, id: NodeId) -> Option<StableNodeId> {
        self.get(id).map(NodeData::stable_id)
    }

    /// Children of `id`, empty for leaves and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(NodeData::children).unwrap_or(&[])
    }

    /// Parent link as this generation records it.
    ///
    /// Nodes that were detached or replaced keep the link of the generation
    /// they were last attached in; use [`SyntaxTree::is_attached`] to tell
    /// them apart.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.parent(id)
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        // Bounded by the slot count so a corrupt chain cannot loop forever.
        let limit = self.arena.len() as usize;
        std::iter::successors(self.parent(id), move |current| self.parent(*current)).take(limit)
    }

    /// Whether following parent links from `id` ends at this tree's root
    pub fn is_attached(&self, id: NodeId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        let top = self.ancestors(id).last().unwrap_or(id);
        top == self.root
    }

    /// Number of links between `id` and the root, if attached
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        if self.is_attached(id) {
            Some(self.ancestors(id).count())
        } else {
            None
        }
    }

    /// Pre-order traversal of the subtree at `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if !self.arena.contains(id) {
            return order;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    /// Number of nodes reachable from the root
    pub fn node_count(&self) -> usize {
        self.descendants(self.root).len()
    }

    /// Deep comparison of two subtrees, possibly from different trees.
    ///
    /// Ids are ignored: two independently built trees with the same shape
    /// and attributes are equal.
    pub fn structurally_eq(&self, id: NodeId, other: &SyntaxTree, other_id: NodeId) -> bool {
        let mut pending = vec![(id, other_id)];
        while let Some((left, right)) = pending.pop() {
            if Arc::ptr_eq(&self.arena, &other.arena) && left == right {
                continue;
            }
            let (Some(left_data), Some(right_data)) = (self.get(left), other.get(right)) else {
                return false;
            };
            if !left_data.same_attributes(right_data)
                || left_data.children().len() != right_data.children().len()
            {
                return false;
            }
            pending.extend(
                left_data
                    .children()
                    .iter()
                    .copied()
                    .zip(right_data.children().iter().copied()),
            );
        }
        true
    }

    /// Hash consistent with [`SyntaxTree::structurally_eq`]
    pub fn structural_hash(&self, id: NodeId) -> u64 {
        let mut hasher = DefaultHasher::new();
        for node in self.descendants(id) {
            if let Some(data) = self.get(node) {
                data.kind().hash(&mut hasher);
                data.range().hash(&mut hasher);
                data.text().hash(&mut hasher);
                data.leading_comments().hash(&mut hasher);
                data.trailing_comments().hash(&mut hasher);
                data.whitespace().hash(&mut hasher);
                data.hints().hash(&mut hasher);
                data.children().len().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// Indented dump of the subtree at `id`, one node per line
    pub fn debug_tree(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![(id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            let Some(data) = self.get(current) else {
                continue;
            };
            let _ = write!(out, "{:indent$}{}", "", data.stable_id(), indent = depth * 2);
            if let Some(text) = data.text() {
                let _ = write!(out, " {text:?}");
            }
            out.push('\n');
            stack.extend(data.children().iter().rev().map(|child| (*child, depth + 1)));
        }
        out
    }
}

/// Builds the first generation of a tree, bottom-up.
///
/// Children must be allocated before their parent; `finish` links parents
/// from the chosen root.
#[derive(Debug)]
pub struct TreeBuilder {
    arena: NodeArena,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
        }
    }

    pub fn alloc(&mut self, data: NodeData) -> Result<NodeId> {
        self.arena.check(&data)?;
        self.arena.push(data)
    }

    pub fn len(&self) -> usize {
        self.arena.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(mut self, root: NodeId) -> Result<SyntaxTree> {
        self.arena.node(root)?;

        let mut seen = HashSet::new();
        seen.insert(root);
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let children = self.arena.node(current)?.children().to_vec();
            for child in children {
                if !seen.insert(child) {
                    return Err(StylerError::invalid_tree_state(format!(
                        "node {child} is attached more than once"
                    )));
                }
                self.arena.set_parent(child, current);
                stack.push(child);
            }
        }

        let unreachable = self.arena.len() as usize - seen.len();
        if unreachable > 0 {
            debug!("Tree finished with {} unreachable nodes", unreachable);
        }
        Ok(SyntaxTree::from_parts(Arc::new(self.arena), root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Comment, SourceRange};
    use crate::test_helpers::{ident, sample_tree};

    #[test]
    fn test_builder_links_parents() {
        let sample = sample_tree();
        let tree = &sample.tree;
        assert_eq!(tree.parent(sample.condition), Some(sample.if_stmt));
        assert_eq!(tree.parent(sample.if_stmt), Some(sample.body));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.depth_of(sample.condition), Some(5));
        assert!(tree.is_attached(sample.condition));
    }

    #[test]
    fn test_builder_rejects_shared_child() {
        let mut builder = TreeBuilder::new();
        let x = builder.alloc(ident("x", 1, 1)).unwrap();
        let first = builder
            .alloc(NodeData::new(NodeKind::Block, SourceRange::default()).with_children([x]))
            .unwrap();
        let second = builder
            .alloc(NodeData::new(NodeKind::Block, SourceRange::default()).with_children([x]))
            .unwrap();
        let block = builder
            .alloc(
                NodeData::new(NodeKind::Block, SourceRange::default())
                    .with_children([first, second]),
            )
            .unwrap();
        let err = builder.finish(block).unwrap_err();
        assert!(err.to_string().contains("attached more than once"));
    }

    #[test]
    fn test_builder_rejects_shape_violation() {
        let mut builder = TreeBuilder::new();
        let x = builder.alloc(ident("x", 1, 1)).unwrap();
        let result = builder.alloc(
            NodeData::new(NodeKind::BinaryExpression, SourceRange::default()).with_children([x]),
        );
        assert!(matches!(result, Err(StylerError::ShapeViolation { .. })));
    }

    #[test]
    fn test_descendants_pre_order() {
        let sample = sample_tree();
        let kinds: Vec<_> = sample
            .tree
            .descendants(sample.if_stmt)
            .into_iter()
            .filter_map(|id| sample.tree.kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::IfStatement,
                NodeKind::BinaryExpression,
                NodeKind::Identifier,
                NodeKind::Literal,
                NodeKind::Block,
                NodeKind::ExpressionStatement,
                NodeKind::Identifier,
            ]
        );
        assert_eq!(sample.tree.node_count(), 13);
    }

    #[test]
    fn test_structural_equality_across_trees() {
        let first = sample_tree();
        let second = sample_tree();
        assert!(!Arc::ptr_eq(first.tree.arena(), second.tree.arena()));
        assert!(
            first
                .tree
                .structurally_eq(first.tree.root(), &second.tree, second.tree.root())
        );
        assert_eq!(
            first.tree.structural_hash(first.tree.root()),
            second.tree.structural_hash(second.tree.root())
        );
        assert!(
            !first
                .tree
                .structurally_eq(first.if_stmt, &second.tree, second.tree.root())
        );
    }

    #[test]
    fn test_structural_equality_sees_comments() {
        let mut builder = TreeBuilder::new();
        let plain = builder.alloc(ident("x", 1, 1)).unwrap();
        let plain_tree = builder.finish(plain).unwrap();

        let mut builder = TreeBuilder::new();
        let commented = builder
            .alloc(ident("x", 1, 1).with_leading_comments(vec![Comment::line("// x")]))
            .unwrap();
        let commented_tree = builder.finish(commented).unwrap();

        assert!(!plain_tree.structurally_eq(plain, &commented_tree, commented));
    }

    #[test]
    fn test_debug_tree_dump() {
        let sample = sample_tree();
        let dump = sample.tree.debug_tree(sample.tree.root());
        insta::assert_snapshot!(dump.trim_end().to_string(), @r#"
        CompilationUnit@1:1-9:2
          ClassDeclaration@1:1-9:2
            Identifier@1:14-1:17 "Foo"
            MethodDeclaration@2:5-8:6
              Identifier@2:17-2:20 "run"
              Block@2:23-8:6
                IfStatement@3:9-7:10
                  BinaryExpression@3:13-3:18 ">"
                    Identifier@3:13-3:14 "x"
                    Literal@3:17-3:18 "0"
                  Block@3:20-7:10
                    ExpressionStatement@4:13-4:19
                      Identifier@4:13-4:16 "log"
        "#);
    }
}
