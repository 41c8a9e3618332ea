//! Worker identity and recorded edit intents

use crate::ast::{NodeId, StableNodeId};
use crate::mutation::{Edit, Operation};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Opaque worker identity, issued by a view in assignment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkerId(u32);

impl WorkerId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// One edit intent recorded by an overlay. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct ModificationRecord {
    sequence: u64,
    target: StableNodeId,
    edit: Edit,
    worker: WorkerId,
    timestamp: Instant,
}

impl ModificationRecord {
    pub(crate) fn new(sequence: u64, target: StableNodeId, edit: Edit, worker: WorkerId) -> Self {
        Self {
            sequence,
            target,
            edit,
            worker,
            timestamp: Instant::now(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.edit.operation()
    }

    /// Position of the record within its overlay, starting at 0
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn target(&self) -> &StableNodeId {
        &self.target
    }

    pub fn edit(&self) -> &Edit {
        &self.edit
    }

    /// Parent of a structural edit, or the node of a metadata edit
    pub fn parent(&self) -> NodeId {
        self.edit.target()
    }

    pub fn old_child(&self) -> Option<NodeId> {
        match &self.edit {
            Edit::Replace { old_child, .. } => Some(*old_child),
            Edit::Remove { child, .. } => Some(*child),
            _ => None,
        }
    }

    pub fn new_child(&self) -> Option<NodeId> {
        self.edit.attached_child()
    }

    pub fn insertion_index(&self) -> Option<usize> {
        match &self.edit {
            Edit::Insert { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

impl fmt::Display for ModificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} {}",
            self.worker,
            self.sequence,
            self.operation(),
            self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, SourceRange};

    #[test]
    fn test_record_accessors() {
        let record = ModificationRecord::new(
            4,
            StableNodeId::new(NodeKind::Block, SourceRange::from_coords(2, 1, 9, 2)),
            Edit::Insert {
                parent: NodeId::from_raw(3),
                index: 1,
                new_child: NodeId::from_raw(20),
            },
            WorkerId::new(2),
        );
        assert_eq!(record.operation(), Operation::Insert);
        assert_eq!(record.parent(), NodeId::from_raw(3));
        assert_eq!(record.old_child(), None);
        assert_eq!(record.new_child(), Some(NodeId::from_raw(20)));
        assert_eq!(record.insertion_index(), Some(1));
        assert_eq!(record.to_string(), "worker-2:4 insert Block@2:1-9:2");
    }

    #[test]
    fn test_worker_order_is_assignment_order() {
        let mut workers = vec![WorkerId::new(3), WorkerId::new(0), WorkerId::new(1)];
        workers.sort();
        assert_eq!(workers, vec![WorkerId::new(0), WorkerId::new(1), WorkerId::new(3)]);
    }
}
