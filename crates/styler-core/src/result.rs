//! Result alias and helpers for rules that issue edits
//!
//! Every edit either takes effect or fails without changing the tree. Some
//! failures only mean "this edit does not fit here": the child was not where
//! the rule expected it, the result would break a node's shape, or the new
//! node was unusable. A formatting rule may skip such an edit and go on with
//! the next one. Everything else (an exhausted budget, a stale id, a merge
//! conflict) means the pass over the file cannot continue.

use crate::error::StylerError;

pub type Result<T> = std::result::Result<T, StylerError>;

/// Skipping of edits that failed on their own
pub trait ResultExt<T> {
    /// `Ok(None)` when the edit was refused but the tree and its budgets are
    /// as they were before the call, so the rule can move on. Errors that end
    /// the pass are returned unchanged.
    fn recoverable(self) -> Result<Option<T>>;

    /// Drop the error after logging it: skipped edits at `warn`, errors that
    /// should have ended the pass at `error`
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(kind = ?err.kind(), "Skipping edit: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        let err = match self {
            Ok(value) => return Some(value),
            Err(err) => err,
        };
        if err.is_recoverable() {
            tracing::warn!(kind = ?err.kind(), "Skipping edit: {}", err);
        } else {
            tracing::error!(kind = ?err.kind(), "Edit failed, tree state may be stale: {}", err);
        }
        None
    }
}
