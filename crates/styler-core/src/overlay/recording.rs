//! Per-worker overlays
//!
//! An [`Overlay`] records edit intents against a shared view without
//! touching it. Each record is validated when it is made by replaying it on
//! the overlay's private shadow generation, so a rule sees errors at the
//! call that caused them.
//!
//! Workers may name a node by any id they have seen, including copies the
//! shadow made of it. Records and created nodes store the id each node had
//! in the view (or at creation), and the reconciler forwards those ids to
//! the latest copies on the merged tree, the same way the shadow did.

use super::record::{ModificationRecord, WorkerId};
use super::view::ImmutableTreeView;
use crate::ast::arena::NodeArena;
use crate::ast::{Comment, NodeData, NodeId, WhitespaceInfo};
use crate::mutation::edit::{self, Edit};
use crate::mutation::forward::ForwardMap;
use crate::mutation::{AncestorRebuilder, PathResolver, ResourceGuard, ResourceStatistics};
use crate::{Result, StylerError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Lifecycle of an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayState {
    Recording,
    Sealed,
    /// Merged into a new generation
    Applied,
    /// Part of a batch the reconciler refused; none of its records took
    /// effect
    Rejected,
}

/// A worker-allocated node as the reconciler imports it
#[derive(Debug, Clone)]
pub(crate) struct CreatedNode {
    pub(crate) id: NodeId,
    /// Children named by their view or creation ids
    pub(crate) data: NodeData,
    /// Number of records made before the node was allocated
    pub(crate) after: usize,
}

/// Edit log of one worker over a shared view.
///
/// Every method validates the edit against the view plus this overlay's
/// earlier records and fails without recording anything if the edit is
/// invalid. Successful records count against both the overlay's own limits
/// and the view's shared budget.
#[derive(Debug)]
pub struct Overlay {
    view: Arc<ImmutableTreeView>,
    worker: WorkerId,
    block: Option<NodeId>,
    shadow: NodeArena,
    root: NodeId,
    forward: ForwardMap,
    created: Vec<CreatedNode>,
    records: Vec<ModificationRecord>,
    guard: ResourceGuard,
}

impl Overlay {
    pub(crate) fn new(
        view: Arc<ImmutableTreeView>,
        worker: WorkerId,
        block: Option<NodeId>,
    ) -> Self {
        debug!("Issuing overlay {} for view {}", worker, view.id());
        let shadow = NodeArena::layered_on(Arc::clone(view.tree().arena()));
        let root = view.root();
        let guard = ResourceGuard::new(view.overlay_limits());
        Self {
            view,
            worker,
            block,
            shadow,
            root,
            forward: ForwardMap::default(),
            created: Vec::new(),
            records: Vec::new(),
            guard,
        }
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    pub fn view(&self) -> &Arc<ImmutableTreeView> {
        &self.view
    }

    /// Subtree this overlay is restricted to, if any
    pub fn block(&self) -> Option<NodeId> {
        self.block
    }

    pub fn state(&self) -> OverlayState {
        OverlayState::Recording
    }

    pub fn records(&self) -> &[ModificationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn statistics(&self) -> ResourceStatistics {
        self.guard.statistics()
    }

    /// Current value of a base node or of a node created by this overlay,
    /// with the overlay's own records applied
    pub fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.shadow.node(self.translate(id))
    }

    /// Allocate a worker-local node. Its children may be nodes of the view
    /// or nodes created earlier by this overlay; the id is remapped when the
    /// overlay is merged.
    ///
    /// Children edited by earlier records are taken at their current value,
    /// so wrapping a node keeps what this overlay already did to it.
    pub fn new_node(&mut self, data: NodeData) -> Result<NodeId> {
        let current: Vec<NodeId> = data
            .children()
            .iter()
            .map(|child| self.forward.resolve(*child))
            .collect();
        let local = data.clone().with_children(current);
        self.shadow.check(&local)?;
        let id = self.shadow.push(local)?;

        let children: Vec<NodeId> = data
            .children()
            .iter()
            .map(|child| self.forward.origin(*child))
            .collect();
        self.created.push(CreatedNode {
            id,
            data: data.with_children(children),
            after: self.records.len(),
        });
        Ok(id)
    }

    /// Record [`Edit::Replace`]
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        new_child: NodeId,
    ) -> Result<()> {
        self.record(Edit::Replace {
            parent,
            old_child,
            new_child,
        })
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        new_child: NodeId,
    ) -> Result<()> {
        self.record(Edit::Insert {
            parent,
            index,
            new_child,
        })
    }

    /// Record an insertion in front of `sibling`, which must be a current
    /// child of `parent`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        sibling: NodeId,
    ) -> Result<()> {
        let index = self.sibling_index(parent, sibling, 0)?;
        self.insert_child(parent, index, new_child)
    }

    pub fn insert_after(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        sibling: NodeId,
    ) -> Result<()> {
        let index = self.sibling_index(parent, sibling, 1)?;
        self.insert_child(parent, index, new_child)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.record(Edit::Remove { parent, child })
    }

    pub fn set_whitespace(&mut self, node: NodeId, whitespace: WhitespaceInfo) -> Result<()> {
        self.record(Edit::SetWhitespace { node, whitespace })
    }

    pub fn set_comments(
        &mut self,
        node: NodeId,
        leading: Vec<Comment>,
        trailing: Vec<Comment>,
    ) -> Result<()> {
        self.record(Edit::SetComments {
            node,
            leading,
            trailing,
        })
    }

    /// Stop recording and hand the log over for reconciliation
    pub fn seal(self) -> SealedOverlay {
        debug!(
            "Sealed overlay {} with {} records and {} created nodes",
            self.worker,
            self.records.len(),
            self.created.len()
        );
        SealedOverlay {
            statistics: self.guard.statistics(),
            view: self.view,
            worker: self.worker,
            block: self.block,
            base_len: self.shadow.base_len(),
            created: self.created,
            records: self.records,
        }
    }

    fn translate(&self, id: NodeId) -> NodeId {
        self.forward.resolve(id)
    }

    fn sibling_index(&self, parent: NodeId, sibling: NodeId, offset: usize) -> Result<usize> {
        edit::sibling_index(
            &self.shadow,
            self.translate(parent),
            self.translate(sibling),
            offset,
        )
    }

    fn record(&mut self, edit: Edit) -> Result<()> {
        let local = edit.map_ids(|id| self.forward.resolve(id));
        let target = self.shadow.node(local.target())?.stable_id();

        let mut scope = self.guard.enter(Some(target.clone()))?;
        scope.ensure_modification_budget(Some(target.clone()))?;

        let resolver = PathResolver::new(scope.limits().max_recursion_depth);
        let (path, replacement) =
            edit::plan(&self.shadow, self.root, &local, &resolver, &self.forward)?;
        if let Some(block) = self.block {
            if !path.contains(self.forward.resolve(block)) {
                return Err(StylerError::invalid_node(format!(
                    "{target} lies outside the block assigned to {}",
                    self.worker
                )));
            }
        }

        let shared = self.view.shared_guard();
        shared.ensure_depth(path.len(), Some(target.clone()))?;
        shared.try_reserve_modification(Some(target.clone()))?;

        let rebuilt = AncestorRebuilder::rebuild(&mut self.shadow, &path, replacement)?;
        scope.commit_modification();
        drop(scope);

        self.forward.record(&rebuilt);
        self.root = rebuilt.root;

        let sequence = self.records.len() as u64;
        let edit = edit.map_ids(|id| self.forward.origin(id));
        let record = ModificationRecord::new(sequence, target, edit, self.worker);
        trace!("Recorded {}", record);
        self.records.push(record);
        Ok(())
    }
}

/// An overlay that accepts no more records.
///
/// Only the [`Reconciler`](super::Reconciler) consumes it; until then the
/// records can be inspected but not changed.
#[derive(Debug)]
pub struct SealedOverlay {
    view: Arc<ImmutableTreeView>,
    worker: WorkerId,
    block: Option<NodeId>,
    base_len: u32,
    created: Vec<CreatedNode>,
    records: Vec<ModificationRecord>,
    statistics: ResourceStatistics,
}

impl SealedOverlay {
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    pub fn view(&self) -> &Arc<ImmutableTreeView> {
        &self.view
    }

    pub fn block(&self) -> Option<NodeId> {
        self.block
    }

    pub fn state(&self) -> OverlayState {
        OverlayState::Sealed
    }

    pub fn records(&self) -> &[ModificationRecord] {
        &self.records
    }

    pub fn statistics(&self) -> ResourceStatistics {
        self.statistics
    }

    /// Nodes created by the worker, in allocation order
    pub fn created_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> + '_ {
        self.created.iter().map(|node| (node.id, &node.data))
    }

    /// Whether `id` names a node of the shared view
    pub(crate) fn is_base_node(&self, id: NodeId) -> bool {
        id.as_u32() < self.base_len
    }

    pub(crate) fn into_parts(self) -> (Vec<CreatedNode>, Vec<ModificationRecord>) {
        (self.created, self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::mutation::{LimitedResource, Operation};
    use crate::test_helpers::{ident, sample_tree};

    #[test]
    fn test_records_are_sequenced_and_view_untouched() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();

        let renamed = overlay.new_node(ident("y", 3, 13)).unwrap();
        overlay
            .replace_child(sample.condition, sample.x, renamed)
            .unwrap();
        overlay
            .set_whitespace(sample.statement, WhitespaceInfo::new("    ", "\n"))
            .unwrap();

        let records = overlay.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence(), 0);
        assert_eq!(records[1].sequence(), 1);
        assert_eq!(records[0].operation(), Operation::Replace);
        assert_eq!(records[0].target().kind, NodeKind::BinaryExpression);
        assert_eq!(records[1].parent(), sample.statement);
        assert!(records[0].timestamp() <= records[1].timestamp());

        assert_eq!(view.tree().children(sample.condition)[0], sample.x);
        assert_eq!(view.shared_statistics().total_modifications, 2);
    }

    #[test]
    fn test_record_validation_errors() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();
        let fresh = overlay.new_node(ident("z", 9, 9)).unwrap();

        let err = overlay
            .replace_child(sample.then_block, sample.x, fresh)
            .unwrap_err();
        assert!(matches!(err, StylerError::NotAChild { child_count: 1, .. }));

        let err = overlay.insert_child(sample.body, 5, fresh).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));

        assert!(overlay.is_empty());
        assert_eq!(view.shared_statistics().total_modifications, 0);
    }

    #[test]
    fn test_insert_next_to_foreign_sibling() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();
        let fresh = overlay.new_node(ident("z", 9, 9)).unwrap();

        let err = overlay
            .insert_before(sample.then_block, fresh, sample.x)
            .unwrap_err();
        assert!(matches!(err, StylerError::NotAChild { child_count: 1, .. }));
        let err = overlay
            .insert_after(sample.body, fresh, sample.statement)
            .unwrap_err();
        assert!(err.is_recoverable());

        assert!(overlay.is_empty());
        assert_eq!(overlay.statistics().total_modifications, 0);
        assert_eq!(view.shared_statistics().total_modifications, 0);
    }

    #[test]
    fn test_records_name_nodes_by_view_ids() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();
        overlay
            .set_whitespace(sample.statement, WhitespaceInfo::new("\n            ", ""))
            .unwrap();

        let current = overlay.node(sample.then_block).unwrap().children()[0];
        assert_ne!(current, sample.statement);
        assert_eq!(
            overlay.node(current).unwrap().whitespace().leading,
            "\n            "
        );
        overlay
            .set_comments(current, vec![Comment::line("// flush")], vec![])
            .unwrap();

        assert_eq!(overlay.records()[1].parent(), sample.statement);
        let sealed = overlay.seal();
        assert!(sealed.is_base_node(sealed.records()[1].parent()));
    }

    #[test]
    fn test_later_records_see_earlier_ones() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();

        let first = overlay.new_node(ident("a", 5, 1)).unwrap();
        let second = overlay.new_node(ident("b", 6, 1)).unwrap();
        overlay
            .insert_after(sample.then_block, first, sample.statement)
            .unwrap();
        // Index 2 only exists once the first insert is applied.
        overlay.insert_child(sample.then_block, 2, second).unwrap();
        overlay.remove_child(sample.then_block, first).unwrap();

        assert_eq!(overlay.len(), 3);
        assert_eq!(overlay.statistics().total_modifications, 3);
    }

    #[test]
    fn test_block_overlay_rejects_outside_edits() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay_for_block(sample.then_block).unwrap();

        overlay
            .set_comments(sample.statement, vec![Comment::line("// call")], vec![])
            .unwrap();
        let err = overlay
            .set_whitespace(sample.condition, WhitespaceInfo::new(" ", " "))
            .unwrap_err();
        assert!(err.to_string().contains("outside the block assigned to worker-0"));
    }

    #[test]
    fn test_new_node_rejects_unknown_children() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();
        let bogus = NodeId::from_raw(10_000);
        let err = overlay
            .new_node(
                NodeData::new(NodeKind::ExpressionStatement, Default::default())
                    .with_children([bogus]),
            )
            .unwrap_err();
        assert!(matches!(err, StylerError::InvalidNode { .. }));
    }

    #[test]
    fn test_overlay_modification_limit() {
        let sample = sample_tree();
        let config = crate::config::MutationConfiguration {
            max_modifications: 1,
            ..Default::default()
        };
        let view = ImmutableTreeView::new(sample.tree.clone(), &config);
        let mut overlay = view.overlay();
        overlay
            .set_whitespace(sample.x, WhitespaceInfo::new(" ", ""))
            .unwrap();
        let err = overlay
            .set_whitespace(sample.statement, WhitespaceInfo::new(" ", ""))
            .unwrap_err();
        assert!(matches!(
            err,
            StylerError::ResourceLimitExceeded {
                resource: LimitedResource::Modifications,
                attempted: 2,
                limit: 1,
                ..
            }
        ));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn test_seal_keeps_created_nodes() {
        let sample = sample_tree();
        let view = ImmutableTreeView::with_defaults(sample.tree.clone());
        let mut overlay = view.overlay();
        let fresh = overlay.new_node(ident("z", 9, 9)).unwrap();
        overlay
            .insert_before(sample.then_block, fresh, sample.statement)
            .unwrap();

        let sealed = overlay.seal();
        assert_eq!(sealed.state(), OverlayState::Sealed);
        assert_eq!(sealed.created_nodes().count(), 1);
        assert_eq!(sealed.created_nodes().next().map(|(id, _)| id), Some(fresh));
        assert!(!sealed.is_base_node(fresh));
        assert!(sealed.is_base_node(sample.statement));
        assert_eq!(sealed.records()[0].insertion_index(), Some(0));
    }
}
