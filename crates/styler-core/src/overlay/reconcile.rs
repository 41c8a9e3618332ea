//! Conflict detection and merging of sealed overlays
//!
//! ## Merge protocol
//!
//! 1. Reject overlays issued by a different view
//! 2. Detect conflicts across workers:
//!    - two workers target the same stable node id
//!    - a worker detaches a subtree that another worker edits inside
//! 3. Fail with the first conflict; every overlay of the batch is rejected
//! 4. Otherwise replay records in worker assignment order, then sequence
//!    order, on one new arena layer over the view's tree. Ids of nodes
//!    rebuilt by earlier records are forwarded to their latest copies.
//!    Worker-created nodes are imported at the point of the record sequence
//!    where they were allocated, so their children are forwarded exactly as
//!    they were in the worker's shadow.

use super::record::WorkerId;
use super::recording::{CreatedNode, OverlayState, SealedOverlay};
use super::view::ImmutableTreeView;
use crate::ast::arena::NodeArena;
use crate::ast::{NodeId, StableNodeId, SyntaxTree};
use crate::mutation::PathResolver;
use crate::mutation::edit;
use crate::mutation::forward::ForwardMap;
use crate::{Result, StylerError};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why two overlays conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictReason {
    /// More than one worker targets the node
    SameTarget,
    /// One worker detaches the subtree at the node while another edits
    /// inside it
    DetachedSubtree,
}

/// Overlapping edits from different workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Node both edits touch: the shared target, or the root of the
    /// detached subtree
    pub node: StableNodeId,
    /// Workers involved, in the order their records were found. For a
    /// detached subtree the remover comes first.
    pub workers: Vec<WorkerId>,
    pub reason: ConflictReason,
}

impl Conflict {
    /// The error a merge fails with when this is the first conflict
    pub fn into_error(self) -> StylerError {
        StylerError::conflict(self.node, self.workers, self.reason)
    }
}

/// Finds overlapping edits across sealed overlays.
///
/// Detection only reads records, so it can run before any merge work and
/// reports every conflict, not only the first.
pub struct ConflictDetector;

impl ConflictDetector {
    /// All conflicts among `overlays`, in deterministic order: same-target
    /// conflicts first, by first appearance
    pub fn detect(view: &ImmutableTreeView, overlays: &[SealedOverlay]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let mut by_target: IndexMap<&StableNodeId, Vec<WorkerId>> = IndexMap::new();
        for overlay in overlays {
            for record in overlay.records() {
                let workers = by_target.entry(record.target()).or_default();
                if !workers.contains(&record.worker()) {
                    workers.push(record.worker());
                }
            }
        }
        for (node, workers) in by_target {
            if workers.len() > 1 {
                conflicts.push(Conflict {
                    node: node.clone(),
                    workers,
                    reason: ConflictReason::SameTarget,
                });
            }
        }

        // Base nodes detached by some worker
        let mut detached: IndexMap<NodeId, WorkerId> = IndexMap::new();
        for overlay in overlays {
            for record in overlay.records() {
                if let Some(child) = record.edit().detached_child() {
                    if overlay.is_base_node(child) {
                        detached.entry(child).or_insert(overlay.worker());
                    }
                }
            }
        }
        if detached.is_empty() {
            return conflicts;
        }

        let tree = view.tree();
        let mut reported: HashSet<(NodeId, WorkerId)> = HashSet::new();
        for overlay in overlays {
            for record in overlay.records() {
                let target = record.parent();
                if !overlay.is_base_node(target) {
                    continue;
                }
                let inside = std::iter::once(target)
                    .chain(tree.ancestors(target))
                    .find_map(|node| {
                        detached
                            .get(&node)
                            .filter(|remover| **remover != overlay.worker())
                            .map(|remover| (node, *remover))
                    });
                if let Some((node, remover)) = inside {
                    if reported.insert((node, overlay.worker())) {
                        if let Some(stable) = tree.stable_id(node) {
                            conflicts.push(Conflict {
                                node: stable,
                                workers: vec![remover, overlay.worker()],
                                reason: ConflictReason::DetachedSubtree,
                            });
                        }
                    }
                }
            }
        }
        conflicts
    }
}

/// Counters of one merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStatistics {
    pub overlays: usize,
    pub records: usize,
    /// Worker-created nodes copied into the merged tree
    pub imported_nodes: usize,
    /// Ancestor copies allocated while replaying records
    pub rebuilt_nodes: usize,
    /// Workers in the order their records were replayed
    pub workers: Vec<WorkerId>,
}

/// A successfully merged batch
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The new generation; the view's tree is unchanged
    pub tree: SyntaxTree,
    pub statistics: MergeStatistics,
    /// Final state of every overlay, by worker
    pub overlay_states: Vec<(WorkerId, OverlayState)>,
}

/// A batch the reconciler refused. No record of any overlay took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRejection {
    pub error: StylerError,
    /// Every overlay of the batch, by worker, in the `Rejected` state
    pub overlay_states: Vec<(WorkerId, OverlayState)>,
}

impl MergeRejection {
    pub fn into_error(self) -> StylerError {
        self.error
    }
}

impl fmt::Display for MergeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} overlays rejected: {}",
            self.overlay_states.len(),
            self.error
        )
    }
}

impl std::error::Error for MergeRejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Merges sealed overlays of one view into a new generation
pub struct Reconciler;

impl Reconciler {
    /// Merge `overlays` into one new tree, or reject the whole batch
    pub fn merge(
        view: &Arc<ImmutableTreeView>,
        overlays: Vec<SealedOverlay>,
    ) -> Result<MergeOutcome> {
        Self::try_merge(view, overlays).map_err(MergeRejection::into_error)
    }

    /// Like [`Reconciler::merge`], but a refused batch also reports the
    /// final state of each overlay
    pub fn try_merge(
        view: &Arc<ImmutableTreeView>,
        overlays: Vec<SealedOverlay>,
    ) -> std::result::Result<MergeOutcome, MergeRejection> {
        let mut workers: Vec<WorkerId> = overlays.iter().map(SealedOverlay::worker).collect();
        workers.sort();

        Self::merge_batch(view, overlays).map_err(|error| {
            let names: Vec<String> = workers.iter().map(ToString::to_string).collect();
            warn!(
                "Rejected {} overlays of view {} ({}): {}",
                workers.len(),
                view.id(),
                names.join(", "),
                error
            );
            MergeRejection {
                error,
                overlay_states: workers
                    .into_iter()
                    .map(|worker| (worker, OverlayState::Rejected))
                    .collect(),
            }
        })
    }

    fn merge_batch(
        view: &Arc<ImmutableTreeView>,
        mut overlays: Vec<SealedOverlay>,
    ) -> Result<MergeOutcome> {
        if let Some(foreign) = overlays
            .iter()
            .find(|overlay| !Arc::ptr_eq(overlay.view(), view))
        {
            return Err(StylerError::invalid_tree_state(format!(
                "overlay {} was issued by view {}, not view {}",
                foreign.worker(),
                foreign.view().id(),
                view.id()
            )));
        }

        let conflicts = ConflictDetector::detect(view, &overlays);
        if let Some(first) = conflicts.into_iter().next() {
            debug!("Conflict on {} ({:?})", first.node, first.reason);
            return Err(first.into_error());
        }

        overlays.sort_by_key(SealedOverlay::worker);

        let mut arena = NodeArena::layered_on(Arc::clone(view.tree().arena()));
        let mut root = view.root();
        let mut forward = ForwardMap::default();
        let resolver = PathResolver::new(view.shared_guard().limits().max_recursion_depth);
        let mut statistics = MergeStatistics {
            overlays: overlays.len(),
            ..MergeStatistics::default()
        };
        let mut overlay_states = Vec::with_capacity(overlays.len());

        for overlay in overlays {
            let worker = overlay.worker();
            let (created, records) = overlay.into_parts();

            let mut imported: HashMap<NodeId, NodeId> = HashMap::with_capacity(created.len());
            let mut pending = created.into_iter().peekable();
            for (index, record) in records.iter().enumerate() {
                while let Some(node) = pending.next_if(|node| node.after <= index) {
                    import(&mut arena, &forward, &mut imported, node)?;
                }
                let edit = record
                    .edit()
                    .map_ids(|id| forward.resolve(imported.get(&id).copied().unwrap_or(id)));
                let rebuilt = edit::apply(&mut arena, root, &edit, &resolver, &forward)?;
                statistics.rebuilt_nodes += rebuilt.copies.len();
                forward.record(&rebuilt);
                root = rebuilt.root;
            }
            // Allocated after the last record, so never attached
            for node in pending {
                import(&mut arena, &forward, &mut imported, node)?;
            }
            statistics.imported_nodes += imported.len();

            debug!("Applied {} records from {}", records.len(), worker);
            statistics.records += records.len();
            statistics.workers.push(worker);
            overlay_states.push((worker, OverlayState::Applied));
        }

        info!(
            "Merged {} overlays ({} records, {} nodes rebuilt, {} forwarded)",
            statistics.overlays,
            statistics.records,
            statistics.rebuilt_nodes,
            forward.len()
        );
        Ok(MergeOutcome {
            tree: SyntaxTree::from_parts(Arc::new(arena), root),
            statistics,
            overlay_states,
        })
    }
}

/// Copy one worker-created node into the merged arena, its children
/// forwarded to their current ids
fn import(
    arena: &mut NodeArena,
    forward: &ForwardMap,
    imported: &mut HashMap<NodeId, NodeId>,
    node: CreatedNode,
) -> Result<()> {
    let children: Vec<NodeId> = node
        .data
        .children()
        .iter()
        .map(|child| forward.resolve(imported.get(child).copied().unwrap_or(*child)))
        .collect();
    let id = arena.push(node.data.with_children(children))?;
    imported.insert(node.id, id);
    Ok(())
}
