//! Capture Context
//!
//! Each engine has at most one active frame: the frame whose function is
//! currently running and whose reads are being captured. Frames nest along
//! the call stack (an effect created or re-run while another frame runs), so
//! entering a frame saves whatever was active before and exiting restores it.
//!
//! # Implementation
//!
//! [`CaptureScope`] is a guard. Entering swaps the engine's active frame and
//! working read-set for fresh ones; [`CaptureScope::finish`] hands back the
//! captured paths and restores the previous pair. If the frame function
//! panics, `Drop` performs the same restoration during unwinding.

use std::cell::RefCell;

use indexmap::IndexSet;

use super::engine::EngineState;
use super::FrameId;

/// The frame/read-set pair that was active before a scope was entered.
struct SavedCapture {
    frame: Option<FrameId>,
    captures: Option<IndexSet<String>>,
}

/// Guard that keeps a frame active for as long as it lives.
pub(crate) struct CaptureScope<'a> {
    state: &'a RefCell<EngineState>,
    frame: FrameId,
    saved: Option<SavedCapture>,
}

impl<'a> CaptureScope<'a> {
    /// Make `frame` the active frame with an empty read-set.
    pub(crate) fn enter(state: &'a RefCell<EngineState>, frame: FrameId) -> Self {
        let saved = {
            let mut state = state.borrow_mut();
            SavedCapture {
                frame: state.active_frame.replace(frame),
                captures: state.active_captures.replace(IndexSet::new()),
            }
        };

        Self {
            state,
            frame,
            saved: Some(saved),
        }
    }

    /// Exit the scope, returning every path read while it was active.
    pub(crate) fn finish(mut self) -> IndexSet<String> {
        self.restore().unwrap_or_default()
    }

    fn restore(&mut self) -> Option<IndexSet<String>> {
        let saved = self.saved.take()?;

        // A panic raised while the engine itself held the borrow leaves the
        // state unreachable; there is nothing consistent left to restore.
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return None;
        };

        debug_assert_eq!(
            state.active_frame,
            Some(self.frame),
            "CaptureScope mismatch: expected {:?}, got {:?}",
            self.frame,
            state.active_frame
        );

        let captured = state.active_captures.take();
        state.active_frame = saved.frame;
        state.active_captures = saved.captures;
        captured
    }
}

impl Drop for CaptureScope<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
