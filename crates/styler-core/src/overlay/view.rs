//! Shared read-only view of one tree generation

use super::record::WorkerId;
use super::recording::Overlay;
use crate::ast::{NodeData, NodeId, NodeKind, SyntaxTree};
use crate::config::limits::BYTES_PER_NODE_ESTIMATE;
use crate::config::{BlockLimits, MutationConfiguration};
use crate::mutation::{LimitedResource, ResourceLimits, ResourceStatistics, SharedResourceGuard};
use crate::{Result, StylerError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::debug;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(0);

/// Read-only wrapper around one tree generation, shared by every worker of a
/// parallel batch.
///
/// The tree itself is immutable; the only interior state is the shared
/// resource guard and the worker id counter, both atomic.
#[derive(Debug)]
pub struct ImmutableTreeView {
    id: u64,
    tree: SyntaxTree,
    node_count: usize,
    overlay_limits: ResourceLimits,
    block_limits: BlockLimits,
    shared_guard: SharedResourceGuard,
    next_worker: AtomicU32,
}

impl ImmutableTreeView {
    pub fn new(tree: SyntaxTree, config: &MutationConfiguration) -> Arc<Self> {
        let node_count = tree.node_count();
        let id = NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Created tree view {} over {} nodes (~{} bytes)",
            id,
            node_count,
            node_count * BYTES_PER_NODE_ESTIMATE
        );
        Arc::new(Self {
            id,
            tree,
            node_count,
            overlay_limits: config.limits(),
            block_limits: config.block,
            shared_guard: SharedResourceGuard::new(config.batch_limits()),
            next_worker: AtomicU32::new(0),
        })
    }

    pub fn with_defaults(tree: SyntaxTree) -> Arc<Self> {
        Self::new(tree, &MutationConfiguration::default())
    }

    /// Process-unique identity of this view
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.tree.node(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.children(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.parent(id)
    }

    /// Closest proper ancestor of `node` with the given kind
    pub fn nearest_ancestor_of_kind(&self, node: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.tree
            .ancestors(node)
            .find(|ancestor| self.tree.kind(*ancestor) == Some(kind))
    }

    /// Nodes reachable from the root
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn estimated_memory_bytes(&self) -> usize {
        self.node_count * BYTES_PER_NODE_ESTIMATE
    }

    pub fn subtree_size(&self, node: NodeId) -> usize {
        self.tree.descendants(node).len()
    }

    pub fn overlay_limits(&self) -> ResourceLimits {
        self.overlay_limits
    }

    pub fn block_limits(&self) -> BlockLimits {
        self.block_limits
    }

    pub fn shared_guard(&self) -> &SharedResourceGuard {
        &self.shared_guard
    }

    pub fn shared_statistics(&self) -> ResourceStatistics {
        self.shared_guard.statistics()
    }

    /// Check that `block` is part of this tree and small enough to hand to
    /// one worker
    pub fn validate_block(&self, block: NodeId) -> Result<()> {
        let data = self.tree.node(block)?;
        if !self.tree.is_attached(block) {
            return Err(StylerError::invalid_tree_state(format!(
                "block {} is not part of the viewed tree",
                data.stable_id()
            )));
        }

        let nodes = self.subtree_size(block);
        if nodes > self.block_limits.max_nodes {
            return Err(StylerError::resource_limit(
                LimitedResource::BlockNodes,
                nodes,
                self.block_limits.max_nodes,
                Some(data.stable_id()),
            ));
        }
        let memory = nodes * BYTES_PER_NODE_ESTIMATE;
        if memory > self.block_limits.max_memory_bytes {
            return Err(StylerError::resource_limit(
                LimitedResource::BlockMemory,
                memory,
                self.block_limits.max_memory_bytes,
                Some(data.stable_id()),
            ));
        }
        Ok(())
    }

    /// Overlay for a worker that may edit anywhere in the tree
    pub fn overlay(self: &Arc<Self>) -> Overlay {
        Overlay::new(Arc::clone(self), self.next_worker_id(), None)
    }

    /// Overlay restricted to the subtree at `block`
    pub fn overlay_for_block(self: &Arc<Self>, block: NodeId) -> Result<Overlay> {
        self.validate_block(block)?;
        Ok(Overlay::new(
            Arc::clone(self),
            self.next_worker_id(),
            Some(block),
        ))
    }

    fn next_worker_id(&self) -> WorkerId {
        WorkerId::new(self.next_worker.fetch_add(1, Ordering::Relaxed))
    }
}
