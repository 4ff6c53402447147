//! Ambient Effects
//!
//! An ambient effect tracks dependencies without being handed an engine.
//! While its function runs, every read reported to any engine is also
//! recorded in a thread-wide capture slot, and the first engine seen becomes
//! the owner. Afterwards a frame is registered with that engine directly from
//! the recorded paths.
//!
//! Only one ambient capture may be active at a time. Nesting would make it
//! ambiguous which capture a read belongs to, so it is rejected with
//! [`ReactiveError::NestedAmbientCapture`].
//!
//! Reading state of a second engine aborts the capture at that read: the
//! stack unwinds out of the function and `ambient_effect` returns
//! [`ReactiveError::CrossEngineCapture`].

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::error;

use super::frame::FrameFn;
use super::Engine;
use crate::error::{ReactiveError, Result};

thread_local! {
    static AMBIENT: RefCell<Option<AmbientCapture>> = const { RefCell::new(None) };
}

#[derive(Default)]
struct AmbientCapture {
    /// The engine owning the state read so far.
    engine: Option<Engine>,
    paths: IndexSet<String>,
}

/// Guard owning the ambient slot for the duration of one capture.
struct AmbientScope {
    finished: bool,
}

impl AmbientScope {
    fn install() -> Result<Self> {
        AMBIENT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(ReactiveError::NestedAmbientCapture);
            }
            *slot = Some(AmbientCapture::default());
            Ok(Self { finished: false })
        })
    }

    fn finish(mut self) -> AmbientCapture {
        self.finished = true;
        take_slot().unwrap_or_default()
    }
}

impl Drop for AmbientScope {
    fn drop(&mut self) {
        if !self.finished {
            take_slot();
        }
    }
}

fn take_slot() -> Option<AmbientCapture> {
    AMBIENT
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
}

/// Whether an ambient capture is in progress on this thread.
pub fn is_capturing() -> bool {
    AMBIENT.with(|slot| slot.borrow().is_some())
}

/// Record a read of `path` on `engine` into the active ambient capture.
///
/// A read from a second engine unwinds with a [`ReactiveError`] payload,
/// which [`ambient_effect`] turns back into an error.
pub(crate) fn record(engine: &Engine, path: &str) {
    let cross_engine = AMBIENT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let Some(capture) = slot.as_mut() else {
            return false;
        };

        match &capture.engine {
            Some(owner) if !owner.ptr_eq(engine) => return true,
            Some(_) => {}
            None => capture.engine = Some(engine.clone()),
        }

        capture.paths.insert(path.to_owned());
        false
    });

    if cross_engine {
        error!(path, "ambient capture read state owned by a second engine");
        // Not a panic: the panic hook stays quiet.
        panic::resume_unwind(Box::new(ReactiveError::CrossEngineCapture));
    }
}

/// Run `func` once and re-run it whenever state it read is written.
///
/// The engine is discovered from the state `func` reads. If it reads no
/// tracked state, nothing is registered. The resulting frame always uses
/// async triggering.
///
/// # Errors
///
/// - [`ReactiveError::NestedAmbientCapture`] if called from inside another
///   ambient effect; `func` is not run.
/// - [`ReactiveError::CrossEngineCapture`] if `func` read state owned by
///   two different engines. `func` stops at that read and no frame is
///   registered.
///
/// Other panics raised by `func` propagate unchanged.
pub fn ambient_effect<F>(func: F) -> Result<()>
where
    F: Fn() + 'static,
{
    let scope = AmbientScope::install()?;
    let func: FrameFn = Rc::new(func);

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| func())) {
        drop(scope);
        return match payload.downcast::<ReactiveError>() {
            Ok(error) => Err(*error),
            Err(payload) => panic::resume_unwind(payload),
        };
    }
    let capture = scope.finish();

    if let Some(engine) = capture.engine {
        engine.add_ambient_capture(func, capture.paths);
    }

    Ok(())
}
