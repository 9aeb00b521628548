//! Error taxonomy for scene graph operations.
//!
//! Scene errors are non-fatal: the failing operation is logged with a negative
//! diagnostic code and turned into a no-op. The error is still returned so that
//! callers which care can react to it.

use thiserror::Error;

/// Errors raised by [`Node`](crate::data_structures::node::Node) mutation and
/// render list traversal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// Appending `child` below `parent` would make the node graph cyclic.
    #[error("adding node '{child}' to '{parent}' would create a cycle")]
    CycleDetected { parent: String, child: String },

    /// Traversal went deeper than the configured limit.
    #[error("scene traversal exceeded the maximum depth of {limit} at node '{node}'")]
    DepthExceeded { limit: usize, node: String },
}

impl SceneError {
    /// Numeric diagnostic code, always negative.
    ///
    /// `-1` is reserved for null arguments, which cannot occur through this API.
    pub fn code(&self) -> i32 {
        match self {
            SceneError::CycleDetected { .. } => -2,
            SceneError::DepthExceeded { .. } => -3,
        }
    }

    /// Log the error through the `log` facade and hand it back.
    pub(crate) fn logged(self) -> Self {
        log::error!("[{}] {}", self.code(), self);
        self
    }
}
