//! Resource limits for edit operations
//!
//! A [`ResourceGuard`] belongs to one mutation context or overlay and is
//! never shared. A [`SharedResourceGuard`] bounds the cumulative use of all
//! overlays recording against one view and is updated with atomics.

use crate::ast::StableNodeId;
use crate::{Result, StylerError};
use serde::Serialize;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Thresholds enforced by a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    pub max_recursion_depth: usize,
    pub max_modifications: usize,
}

impl ResourceLimits {
    /// Limits of a single mutation context or overlay
    pub const CONTEXT: ResourceLimits = ResourceLimits {
        max_recursion_depth: 1000,
        max_modifications: 10_000,
    };

    /// Cumulative limits of all overlays sharing one view
    pub const BATCH: ResourceLimits = ResourceLimits {
        max_recursion_depth: 2000,
        max_modifications: 50_000,
    };

    pub fn new(max_recursion_depth: usize, max_modifications: usize) -> Self {
        Self {
            max_recursion_depth,
            max_modifications,
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::CONTEXT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LimitedResource {
    RecursionDepth,
    Modifications,
    BlockNodes,
    BlockMemory,
}

impl fmt::Display for LimitedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimitedResource::RecursionDepth => "recursion depth",
            LimitedResource::Modifications => "modification count",
            LimitedResource::BlockNodes => "block node count",
            LimitedResource::BlockMemory => "block memory",
        };
        f.write_str(name)
    }
}

/// Snapshot of a guard's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatistics {
    pub total_modifications: usize,
    pub current_depth: usize,
    pub max_depth_reached: usize,
    pub limits: ResourceLimits,
}

impl ResourceStatistics {
    /// Fraction of the modification budget used, from 0.0 to 1.0
    pub fn modification_ratio(&self) -> f64 {
        if self.limits.max_modifications == 0 {
            return 1.0;
        }
        self.total_modifications as f64 / self.limits.max_modifications as f64
    }
}

fn exceeded(
    resource: LimitedResource,
    attempted: usize,
    limit: usize,
    node: Option<StableNodeId>,
) -> StylerError {
    match &node {
        Some(node) => warn!("{} limit {} exceeded at {}", resource, limit, node),
        None => warn!("{} limit {} exceeded", resource, limit),
    }
    StylerError::resource_limit(resource, attempted, limit, node)
}

/// Per-context depth and modification counters
#[derive(Debug)]
pub struct ResourceGuard {
    limits: ResourceLimits,
    depth: usize,
    max_depth_reached: usize,
    modifications: usize,
}

impl Default for ResourceGuard {
    fn default() -> Self {
        Self::new(ResourceLimits::default())
    }
}

impl ResourceGuard {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            depth: 0,
            max_depth_reached: 0,
            modifications: 0,
        }
    }

    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    /// Enter one level of nesting; the level is left when the scope drops,
    /// on success and error paths alike.
    pub fn enter(&mut self, node: Option<StableNodeId>) -> Result<DepthScope<'_>> {
        let attempted = self.depth + 1;
        if attempted > self.limits.max_recursion_depth {
            return Err(exceeded(
                LimitedResource::RecursionDepth,
                attempted,
                self.limits.max_recursion_depth,
                node,
            ));
        }
        self.depth = attempted;
        self.max_depth_reached = self.max_depth_reached.max(attempted);
        Ok(DepthScope { guard: self })
    }

    /// Fail if one more modification would cross the limit.
    ///
    /// Nothing is counted until [`ResourceGuard::commit_modification`], so a
    /// rejected edit leaves the counters untouched.
    pub fn ensure_modification_budget(&self, node: Option<StableNodeId>) -> Result<()> {
        let attempted = self.modifications + 1;
        if attempted > self.limits.max_modifications {
            return Err(exceeded(
                LimitedResource::Modifications,
                attempted,
                self.limits.max_modifications,
                node,
            ));
        }
        Ok(())
    }

    pub fn commit_modification(&mut self) {
        self.modifications += 1;
    }

    pub fn modification_count(&self) -> usize {
        self.modifications
    }

    pub fn current_depth(&self) -> usize {
        self.depth
    }

    pub fn statistics(&self) -> ResourceStatistics {
        ResourceStatistics {
            total_modifications: self.modifications,
            current_depth: self.depth,
            max_depth_reached: self.max_depth_reached,
            limits: self.limits,
        }
    }
}

/// One level of nesting held on a [`ResourceGuard`]
#[derive(Debug)]
pub struct DepthScope<'a> {
    guard: &'a mut ResourceGuard,
}

impl Deref for DepthScope<'_> {
    type Target = ResourceGuard;

    fn deref(&self) -> &Self::Target {
        self.guard
    }
}

impl DerefMut for DepthScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
    }
}

impl Drop for DepthScope<'_> {
    fn drop(&mut self) {
        self.guard.depth = self.guard.depth.saturating_sub(1);
    }
}

/// Cumulative limits across every overlay of one view
#[derive(Debug)]
pub struct SharedResourceGuard {
    limits: ResourceLimits,
    modifications: AtomicUsize,
    max_depth_reached: AtomicUsize,
}

impl Default for SharedResourceGuard {
    fn default() -> Self {
        Self::new(ResourceLimits::BATCH)
    }
}

impl SharedResourceGuard {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            modifications: AtomicUsize::new(0),
            max_depth_reached: AtomicUsize::new(0),
        }
    }

    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    /// Claim one modification from the shared budget, or fail without
    /// claiming anything.
    pub fn try_reserve_modification(&self, node: Option<StableNodeId>) -> Result<()> {
        let limit = self.limits.max_modifications;
        self.modifications
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < limit).then_some(current + 1)
            })
            .map(|_| ())
            .map_err(|current| exceeded(LimitedResource::Modifications, current + 1, limit, node))
    }

    /// Check a path depth against the shared limit and remember the deepest
    /// accepted one.
    pub fn ensure_depth(&self, depth: usize, node: Option<StableNodeId>) -> Result<()> {
        let limit = self.limits.max_recursion_depth;
        if depth > limit {
            return Err(exceeded(LimitedResource::RecursionDepth, depth, limit, node));
        }
        self.max_depth_reached.fetch_max(depth, Ordering::AcqRel);
        Ok(())
    }

    pub fn modification_count(&self) -> usize {
        self.modifications.load(Ordering::Acquire)
    }

    pub fn statistics(&self) -> ResourceStatistics {
        ResourceStatistics {
            total_modifications: self.modification_count(),
            current_depth: 0,
            max_depth_reached: self.max_depth_reached.load(Ordering::Acquire),
            limits: self.limits,
        }
    }
}
