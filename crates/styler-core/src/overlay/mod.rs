//! Thread-local overlays over a shared tree view
//!
//! Workers never mutate the tree they read. Each one records edit intents in
//! its own [`Overlay`] against a shared [`ImmutableTreeView`]; the
//! [`Reconciler`] checks the sealed overlays for conflicts and replays them
//! into a single new generation.
//!
//! Within one overlay, records apply in recording order. Across overlays,
//! records apply in worker assignment order, which is only observable if
//! edits overlap, and overlapping edits are rejected as conflicts.

pub mod parallel;
pub mod reconcile;
pub mod record;
pub mod recording;
pub mod view;

pub use parallel::{edit_blocks, edit_blocks_with_threads};
pub use reconcile::{
    Conflict, ConflictDetector, ConflictReason, MergeOutcome, MergeRejection, MergeStatistics,
    Reconciler,
};
pub use record::{ModificationRecord, WorkerId};
pub use recording::{Overlay, OverlayState, SealedOverlay};
pub use view::ImmutableTreeView;
