//! Block-parallel rule driver
//!
//! Each block of a file gets its own overlay, so rules for different blocks
//! run on pool threads without sharing anything mutable. Overlays are issued
//! before the parallel section, which fixes the worker assignment order
//! independently of thread scheduling.

use super::reconcile::{MergeOutcome, Reconciler};
use super::recording::{Overlay, SealedOverlay};
use super::view::ImmutableTreeView;
use crate::ast::NodeId;
use crate::{Result, StylerError};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Run `rule` once per block on the global rayon pool and merge the results
pub fn edit_blocks<F>(
    view: &Arc<ImmutableTreeView>,
    blocks: &[NodeId],
    rule: F,
) -> Result<MergeOutcome>
where
    F: Fn(&mut Overlay, NodeId) -> Result<()> + Sync,
{
    let start = Instant::now();
    let overlays = blocks
        .iter()
        .map(|block| view.overlay_for_block(*block))
        .collect::<Result<Vec<_>>>()?;

    let sealed: Vec<SealedOverlay> = overlays
        .into_par_iter()
        .zip(blocks.par_iter())
        .map(|(mut overlay, block)| {
            rule(&mut overlay, *block)?;
            debug!(
                "{} recorded {} edits for block {}",
                overlay.worker(),
                overlay.len(),
                block
            );
            Ok(overlay.seal())
        })
        .collect::<Result<Vec<_>>>()?;

    let outcome = Reconciler::merge(view, sealed)?;
    info!(
        "Edited {} blocks with {} records in {:?}",
        blocks.len(),
        outcome.statistics.records,
        start.elapsed()
    );
    Ok(outcome)
}

/// Same as [`edit_blocks`] on a dedicated pool of `threads` threads
pub fn edit_blocks_with_threads<F>(
    view: &Arc<ImmutableTreeView>,
    blocks: &[NodeId],
    threads: usize,
    rule: F,
) -> Result<MergeOutcome>
where
    F: Fn(&mut Overlay, NodeId) -> Result<()> + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("styler-worker-{index}"))
        .build()
        .map_err(|e| StylerError::config_error(format!("Could not build thread pool: {e}")))?;
    pool.install(|| edit_blocks(view, blocks, rule))
}
