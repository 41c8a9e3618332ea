//! Bottom-up ancestor reconstruction (path copying)

use super::path::TreePath;
use crate::ast::NodeData;
use crate::ast::NodeId;
use crate::ast::arena::NodeArena;
use crate::{Result, StylerError};

/// Result of rebuilding one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rebuilt {
    pub root: NodeId,
    /// `(old, new)` for every node on the path, target first
    pub copies: Vec<(NodeId, NodeId)>,
}

impl Rebuilt {
    /// New id of `old`, if it was on the rebuilt path
    pub fn copy_of(&self, old: NodeId) -> Option<NodeId> {
        self.copies
            .iter()
            .find(|(original, _)| *original == old)
            .map(|(_, copy)| *copy)
    }
}

pub struct AncestorRebuilder;

impl AncestorRebuilder {
    /// Allocate `replacement` for the path's target and a copy of every
    /// ancestor, each equal to the original except for the child slot that
    /// held the previous path node.
    ///
    /// Positions are found by identity. All checks run before the first
    /// allocation, so on error the arena is unchanged.
    pub(crate) fn rebuild(
        arena: &mut NodeArena,
        path: &TreePath,
        replacement: NodeData,
    ) -> Result<Rebuilt> {
        arena.check(&replacement)?;
        arena.ensure_capacity(path.len())?;

        let first = arena.len();
        let nodes = path.nodes();
        let mut planned = Vec::with_capacity(nodes.len());
        planned.push(replacement);

        for level in (0..nodes.len() - 1).rev() {
            let ancestor = nodes[level];
            let old_child = nodes[level + 1];
            let mut copy = arena.node(ancestor)?.clone();
            let position = copy.position_of(old_child).ok_or_else(|| {
                StylerError::invalid_tree_state(format!(
                    "path link {ancestor} -> {old_child} is not a child relation"
                ))
            })?;
            let new_child = NodeId::from_raw(first + planned.len() as u32 - 1);
            copy.children_mut()[position] = new_child;
            planned.push(copy);
        }

        let mut copies = Vec::with_capacity(planned.len());
        for (data, old) in planned.into_iter().zip(nodes.iter().rev()) {
            let new = arena.push(data)?;
            copies.push((*old, new));
        }

        let root = copies[copies.len() - 1].1;
        arena.link_subtree(root);
        Ok(Rebuilt { root, copies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SyntaxTree;
    use crate::mutation::PathResolver;
    use crate::test_helpers::{ident, sample_tree};
    use std::sync::Arc;

    #[test]
    fn test_rebuild_copies_only_the_path() {
        let sample = sample_tree();
        let mut arena = NodeArena::layered_on(Arc::clone(sample.tree.arena()));
        let path = PathResolver::new(100)
            .resolve(&sample.tree, sample.x)
            .unwrap();

        let renamed = ident("y", 3, 13);
        let rebuilt = AncestorRebuilder::rebuild(&mut arena, &path, renamed).unwrap();
        assert_eq!(rebuilt.copies.len(), path.len());
        assert_eq!(arena.local_nodes().count(), path.len());

        let new_tree = SyntaxTree::from_parts(Arc::new(arena), rebuilt.root);
        let new_x = rebuilt.copy_of(sample.x).unwrap();
        assert_eq!(new_tree.get(new_x).and_then(|d| d.text()), Some("y"));

        // Off-path nodes are shared by id.
        let new_condition = rebuilt.copy_of(sample.condition).unwrap();
        let old_literal = sample.tree.children(sample.condition)[1];
        assert_eq!(new_tree.children(new_condition)[1], old_literal);
        assert_eq!(new_tree.parent(old_literal), Some(new_condition));
        assert!(new_tree.is_attached(sample.then_block));

        // The old generation is untouched.
        assert_eq!(sample.tree.get(sample.x).and_then(|d| d.text()), Some("x"));
        assert_eq!(sample.tree.parent(old_literal), Some(sample.condition));
        assert!(!new_tree.is_attached(sample.x));
    }

    #[test]
    fn test_rebuild_rejects_invalid_replacement_without_allocating() {
        let sample = sample_tree();
        let mut arena = NodeArena::layered_on(Arc::clone(sample.tree.arena()));
        let path = PathResolver::new(100)
            .resolve(&sample.tree, sample.condition)
            .unwrap();

        let lopsided = sample
            .tree
            .node(sample.condition)
            .unwrap()
            .clone()
            .with_children([sample.x]);
        let err = AncestorRebuilder::rebuild(&mut arena, &path, lopsided).unwrap_err();
        assert!(matches!(err, StylerError::ShapeViolation { .. }));
        assert_eq!(arena.local_nodes().count(), 0);
    }
}
