//! Layered, append-only node storage
//!
//! Each generation of a tree is a layer: the slots and parent links it added
//! on top of a frozen base layer shared through an `Arc`. Ids below
//! `base_len` resolve in the base, ids at or above it resolve locally, so a
//! new generation costs only the nodes it rebuilt.

use super::node::{NodeData, NodeId};
use crate::{Result, StylerError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    base: Option<Arc<NodeArena>>,
    base_len: u32,
    nodes: Vec<NodeData>,
    /// Parent links set by this layer; they shadow the base's links
    parents: HashMap<NodeId, NodeId>,
    layers: usize,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self {
            layers: 1,
            ..Self::default()
        }
    }

    pub(crate) fn layered_on(base: Arc<NodeArena>) -> Self {
        let base_len = base.len();
        let layers = base.layers + 1;
        Self {
            base: Some(base),
            base_len,
            nodes: Vec::new(),
            parents: HashMap::new(),
            layers,
        }
    }

    /// Total number of slots visible through this layer
    pub(crate) fn len(&self) -> u32 {
        // The push path rejects growth past u32::MAX.
        self.base_len + self.nodes.len() as u32
    }

    pub(crate) fn base_len(&self) -> u32 {
        self.base_len
    }

    /// Number of layers, this one included
    pub(crate) fn layers(&self) -> usize {
        self.layers
    }

    /// Slots owned by this layer, in allocation order
    #[cfg(test)]
    pub(crate) fn local_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        let base_len = self.base_len;
        self.nodes
            .iter()
            .enumerate()
            .map(move |(offset, data)| (NodeId::from_raw(base_len + offset as u32), data))
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeData> {
        let mut layer = self;
        loop {
            if id.as_u32() >= layer.base_len {
                return layer.nodes.get(id.index() - layer.base_len as usize);
            }
            layer = layer.base.as_deref()?;
        }
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        let mut layer = self;
        loop {
            if let Some(parent) = layer.parents.get(&id) {
                return Some(*parent);
            }
            layer = layer.base.as_deref()?;
        }
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.as_u32() < self.len()
    }

    /// Look up a node or report it as unknown to this tree
    pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.get(id).ok_or_else(|| {
            StylerError::invalid_tree_state(format!(
                "node {id} does not exist in this tree ({} slots)",
                self.len()
            ))
        })
    }

    /// Validate a node value before it is allocated: grammar shape, hints,
    /// and that every child already exists and appears once.
    pub(crate) fn check(&self, data: &NodeData) -> Result<()> {
        data.validate()?;
        if let Some(missing) = data.children().iter().find(|child| !self.contains(**child)) {
            return Err(StylerError::invalid_node(format!(
                "{} references unknown child {missing}",
                data.stable_id()
            )));
        }
        let mut seen = HashSet::with_capacity(data.children().len());
        if let Some(repeated) = data.children().iter().find(|child| !seen.insert(**child)) {
            return Err(StylerError::invalid_node(format!(
                "{} lists child {repeated} twice",
                data.stable_id()
            )));
        }
        Ok(())
    }

    /// Fail unless `count` more slots can be allocated
    pub(crate) fn ensure_capacity(&self, count: usize) -> Result<()> {
        let available = (u32::MAX - self.len()) as usize;
        if count > available {
            return Err(StylerError::invalid_tree_state(format!(
                "node arena exhausted: {count} slots requested, {available} available"
            )));
        }
        Ok(())
    }

    /// Append a node that has already been checked
    pub(crate) fn push(&mut self, data: NodeData) -> Result<NodeId> {
        self.ensure_capacity(1)?;
        let id = NodeId::from_raw(self.len());
        self.nodes.push(data);
        Ok(id)
    }

    pub(crate) fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.parents.insert(child, parent);
    }

    /// Point the parent link of every child reachable from `node` whose link
    /// does not already name its parent in this generation.
    ///
    /// Shared subtrees already carry correct links, so the walk stops at the
    /// first child whose link is right.
    pub(crate) fn link_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let children = match self.get(current) {
                Some(data) => data.children().to_vec(),
                None => continue,
            };
            for child in children {
                if self.parent(child) != Some(current) {
                    self.set_parent(child, current);
                    stack.push(child);
                }
            }
        }
    }
}
