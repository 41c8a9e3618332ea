//! Limit settings for contexts, overlays, batches and blocks

use crate::mutation::ResourceLimits;
use crate::{Result, StylerError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Estimated memory per node used for block size checks
pub const BYTES_PER_NODE_ESTIMATE: usize = 200;

/// Root configuration of the mutation engine
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MutationConfiguration {
    /// Longest root-to-node path an edit may walk
    #[schemars(description = "Maximum nesting depth for one mutation context or overlay")]
    pub max_recursion_depth: usize,

    #[schemars(description = "Maximum number of edits per mutation context or overlay")]
    pub max_modifications: usize,

    #[schemars(description = "Cumulative limits across all overlays of one tree view")]
    pub batch: BatchLimits,

    #[schemars(description = "Size limits for a block handed to one worker")]
    pub block: BlockLimits,
}

impl Default for MutationConfiguration {
    fn default() -> Self {
        let limits = ResourceLimits::CONTEXT;
        Self {
            max_recursion_depth: limits.max_recursion_depth,
            max_modifications: limits.max_modifications,
            batch: BatchLimits::default(),
            block: BlockLimits::default(),
        }
    }
}

/// Limits shared by every overlay of one view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchLimits {
    #[schemars(description = "Maximum path depth accepted from any overlay")]
    pub max_recursion_depth: usize,

    #[schemars(description = "Maximum number of edits recorded by all overlays together")]
    pub max_modifications: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        let limits = ResourceLimits::BATCH;
        Self {
            max_recursion_depth: limits.max_recursion_depth,
            max_modifications: limits.max_modifications,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockLimits {
    #[schemars(description = "Maximum number of nodes in one block")]
    pub max_nodes: usize,

    #[schemars(description = "Maximum estimated memory of one block, in bytes")]
    pub max_memory_bytes: usize,
}

impl Default for BlockLimits {
    fn default() -> Self {
        Self {
            max_nodes: 100_000,
            max_memory_bytes: 50 * 1024 * 1024,
        }
    }
}

impl MutationConfiguration {
    /// Limits of one mutation context or overlay
    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits::new(self.max_recursion_depth, self.max_modifications)
    }

    pub fn batch_limits(&self) -> ResourceLimits {
        ResourceLimits::new(self.batch.max_recursion_depth, self.batch.max_modifications)
    }

    /// Reject zero limits and batch limits narrower than per-overlay limits
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let positive = [
            ("maxRecursionDepth", self.max_recursion_depth),
            ("maxModifications", self.max_modifications),
            ("batch.maxRecursionDepth", self.batch.max_recursion_depth),
            ("batch.maxModifications", self.batch.max_modifications),
            ("block.maxNodes", self.block.max_nodes),
            ("block.maxMemoryBytes", self.block.max_memory_bytes),
        ];
        for (name, value) in positive {
            if value == 0 {
                errors.push(format!("{name} must be greater than 0"));
            }
        }

        if self.batch.max_recursion_depth < self.max_recursion_depth {
            errors.push(format!(
                "batch.maxRecursionDepth ({}) must not be less than maxRecursionDepth ({})",
                self.batch.max_recursion_depth, self.max_recursion_depth
            ));
        }
        if self.batch.max_modifications < self.max_modifications {
            errors.push(format!(
                "batch.maxModifications ({}) must not be less than maxModifications ({})",
                self.batch.max_modifications, self.max_modifications
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StylerError::config_error(errors.join("; ")))
        }
    }
}
