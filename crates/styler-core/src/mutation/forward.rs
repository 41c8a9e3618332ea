//! Forwarding from rebuilt nodes to their latest copies

use super::rebuild::Rebuilt;
use crate::ast::NodeId;
use std::collections::HashMap;

/// Maps every path-copied node to the copy that replaced it.
///
/// Copies always get larger ids than their originals, so following the
/// chain terminates. A node with a forward link is superseded: its value
/// belongs to an older generation and must not be attached again.
#[derive(Debug, Default, Clone)]
pub(crate) struct ForwardMap {
    links: HashMap<NodeId, NodeId>,
    origins: HashMap<NodeId, NodeId>,
}

impl ForwardMap {
    pub(crate) fn record(&mut self, rebuilt: &Rebuilt) {
        for (old, new) in &rebuilt.copies {
            self.links.insert(*old, *new);
            let origin = self.origin(*old);
            self.origins.insert(*new, origin);
        }
    }

    /// Latest copy of `id`, or `id` itself if it was never copied
    pub(crate) fn resolve(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(next) = self.links.get(&current) {
            current = *next;
        }
        current
    }

    /// The node `id` was first copied from, or `id` itself if it is not a
    /// copy
    pub(crate) fn origin(&self, id: NodeId) -> NodeId {
        self.origins.get(&id).copied().unwrap_or(id)
    }

    pub(crate) fn is_superseded(&self, id: NodeId) -> bool {
        self.links.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }
}
