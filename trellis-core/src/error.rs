//! Error types.

use thiserror::Error;

/// Errors surfaced by the reactive engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// `ambient_effect` was called while another ambient capture was active.
    #[error("nested calls to ambient_effect are not allowed")]
    NestedAmbientCapture,

    /// An ambient capture read state owned by more than one engine.
    #[error("ambient capture read state from more than one engine")]
    CrossEngineCapture,
}

/// Result alias for fallible engine operations.
pub type Result<T> = std::result::Result<T, ReactiveError>;
