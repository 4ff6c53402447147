//! Capture frames.
//!
//! A frame is one re-executable unit of tracked computation. Frames are
//! owned by the [`Engine`](super::Engine) and referred to everywhere else by
//! their [`FrameId`], so parent/child links never form ownership cycles.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique identifier for a frame.
///
/// Ids are handed out by a process-wide counter starting at 1 and are never
/// reused, even after the frame they named has been torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    /// Generate a new unique frame ID.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// When a frame re-executes after one of its paths is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Re-execute inline, before the write returns.
    Sync,

    /// Coalesce writes and re-execute once at the next scheduler checkpoint.
    #[default]
    Async,
}

/// The function a frame runs. Frames are re-run many times, so it is shared.
pub(crate) type FrameFn = Rc<dyn Fn()>;

/// A registered frame.
pub(crate) struct Frame {
    pub(crate) id: FrameId,
    pub(crate) parent: Option<FrameId>,
    pub(crate) func: FrameFn,
    pub(crate) mode: TriggerMode,
}

impl Frame {
    pub(crate) fn new(parent: Option<FrameId>, func: FrameFn, mode: TriggerMode) -> Self {
        Self {
            id: FrameId::next(),
            parent,
            func,
            mode,
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("mode", &self.mode)
            .finish()
    }
}
