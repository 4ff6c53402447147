//! Reactive Engine
//!
//! The engine is the coordinator between tracked state and the frames that
//! read it. It owns every frame, the path subscription maps (one per
//! [`TriggerMode`]), the frame hierarchy and the pending async flush.
//!
//! # How It Works
//!
//! 1. `effect` creates a frame parented to the active frame (if any) and runs
//!    it once. Every `register(path)` reported while it runs lands in the
//!    frame's read-set.
//!
//! 2. When the function returns, the frame is subscribed to every path it
//!    read, in the map selected by its trigger mode.
//!
//! 3. `trigger(path)` re-runs sync subscribers inline and queues the path for
//!    async subscribers. The first queued path schedules one flush; later
//!    writes in the same turn join it. Without a [`Scheduler`] the flush waits
//!    for `complete_effects` (or `flush_effects`) to drive it.
//!
//! 4. Re-running a frame first clears it: its subscriptions are dropped and
//!    its descendants are destroyed, since the new run creates fresh ones.
//!
//! # Deduplication
//!
//! Both subscription sets and execution batches go through
//! [`Hierarchy::ensure_ancestor`]: a frame is never present alongside one of
//! its ancestors, because re-running the ancestor re-runs the frame anyway.
//!
//! # Threading
//!
//! An engine is confined to the thread that created it (`Rc`/`RefCell`).
//! No borrow of the internal state is held while a frame function runs, so
//! frame functions may freely read, write and create effects.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use tracing::{debug, trace};

use super::ambient;
use super::context::CaptureScope;
use super::frame::{Frame, FrameFn};
use super::hierarchy::Hierarchy;
use super::scheduler::Scheduler;
use super::{FrameId, TriggerMode};
use crate::config::{EffectOptions, EngineConfig};

/// Mutable bookkeeping behind an [`Engine`].
#[derive(Default)]
pub(crate) struct EngineState {
    /// The frame currently executing, if any.
    pub(crate) active_frame: Option<FrameId>,

    /// Paths read by the active frame so far.
    pub(crate) active_captures: Option<IndexSet<String>>,

    frames: HashMap<FrameId, Frame>,
    hierarchy: Hierarchy,

    sync_triggers: HashMap<String, IndexSet<FrameId>>,
    async_triggers: HashMap<String, IndexSet<FrameId>>,

    /// Paths written since the last flush that have async subscribers.
    queued_paths: IndexSet<String>,

    /// Generation of the flush that has not run yet, if any.
    pending_flush: Option<u64>,
    flush_generation: u64,
}

impl EngineState {
    /// Mark a flush as pending. Returns its generation if it is a new one.
    fn queue_flush(&mut self) -> Option<u64> {
        if self.pending_flush.is_some() {
            return None;
        }
        self.flush_generation += 1;
        self.pending_flush = Some(self.flush_generation);
        Some(self.flush_generation)
    }

    fn triggers(&self, mode: TriggerMode) -> &HashMap<String, IndexSet<FrameId>> {
        match mode {
            TriggerMode::Sync => &self.sync_triggers,
            TriggerMode::Async => &self.async_triggers,
        }
    }

    /// Remove a frame's subscriptions and destroy its descendants.
    fn clear_frame(&mut self, id: FrameId) {
        let descendants = self.hierarchy.prune(id);

        for triggers in [&mut self.sync_triggers, &mut self.async_triggers] {
            triggers.retain(|_, ids| {
                if let Some(descendants) = &descendants {
                    ids.retain(|frame| !descendants.contains(frame));
                }
                ids.shift_remove(&id);
                !ids.is_empty()
            });
        }

        if let Some(descendants) = descendants {
            for descendant in &descendants {
                self.frames.remove(descendant);
            }
            trace!(frame = %id, destroyed = descendants.len(), "cleared frame");
        }
    }
}

pub(crate) struct EngineInner {
    state: RefCell<EngineState>,
    config: EngineConfig,
    scheduler: Option<Rc<dyn Scheduler>>,
}

impl EngineInner {
    fn create_frame(&self, func: FrameFn, mode: TriggerMode) -> FrameId {
        let mut state = self.state.borrow_mut();
        let frame = Frame::new(state.active_frame, func, mode);
        let id = frame.id;

        // The active frame was torn down by its own write. A child of it would
        // never be cleared, so it runs once without being registered.
        if let Some(parent) = frame.parent.filter(|parent| !state.frames.contains_key(parent)) {
            trace!(frame = %id, %parent, "parent destroyed, frame not registered");
            return id;
        }

        state.hierarchy.link(id, frame.parent);
        trace!(frame = %id, parent = ?frame.parent, ?mode, "created frame");
        state.frames.insert(id, frame);
        id
    }

    /// Run a frame under a capture scope, then subscribe it to what it read.
    fn capture(&self, id: FrameId, func: &FrameFn) {
        let scope = CaptureScope::enter(&self.state, id);
        func();
        let captured = scope.finish();

        self.subscribe(id, &captured);
    }

    fn subscribe(&self, id: FrameId, paths: &IndexSet<String>) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;

        // The run may have torn this frame down (e.g. by writing to a path
        // its ancestor depends on).
        let Some(mode) = state.frames.get(&id).map(|frame| frame.mode) else {
            return;
        };

        let triggers = match mode {
            TriggerMode::Sync => &mut state.sync_triggers,
            TriggerMode::Async => &mut state.async_triggers,
        };

        for path in paths {
            match triggers.get_mut(path.as_str()) {
                Some(ids) => state.hierarchy.ensure_ancestor(ids, id),
                None => {
                    triggers.insert(path.clone(), IndexSet::from([id]));
                }
            }
        }
    }

    fn register(&self, path: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(captures) = state.active_captures.as_mut() {
            if !captures.contains(path) {
                captures.insert(path.to_owned());
            }
        }
    }

    fn execute_frames(&self, ids: impl IntoIterator<Item = FrameId>) {
        for id in ids {
            let func = {
                let mut state = self.state.borrow_mut();
                // Destroyed by an earlier frame in the same batch.
                let Some(func) = state.frames.get(&id).map(|frame| frame.func.clone()) else {
                    continue;
                };
                state.clear_frame(id);
                func
            };

            trace!(frame = %id, "re-executing frame");
            self.capture(id, &func);
        }
    }

    /// Run flush `generation` unless it already ran.
    fn run_flush(&self, generation: u64) {
        if self.state.borrow().pending_flush != Some(generation) {
            return;
        }
        self.flush();
    }

    /// Run every async frame subscribed to a queued path, once each.
    fn flush(&self) {
        let batch = {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;

            let paths = std::mem::take(&mut state.queued_paths);
            // Writes made by the frames below must schedule a new flush.
            state.pending_flush = None;

            let mut batch = IndexSet::new();
            for path in &paths {
                if let Some(ids) = state.async_triggers.remove(path.as_str()) {
                    for id in ids {
                        state.hierarchy.ensure_ancestor(&mut batch, id);
                    }
                }
            }

            debug!(paths = paths.len(), frames = batch.len(), "flushing async triggers");
            batch
        };

        self.execute_frames(batch);
    }
}

/// Tracks which frames read which paths and re-runs them on writes.
///
/// `Engine` is a cheap handle; clones share the same frames and maps.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use trellis_core::{EffectOptions, Engine};
///
/// let engine = Engine::new();
/// let runs = Rc::new(RefCell::new(0));
///
/// let counter = runs.clone();
/// let tracked = engine.clone();
/// engine.effect_with(
///     move || {
///         tracked.register("[count]");
///         *counter.borrow_mut() += 1;
///     },
///     EffectOptions::sync(),
/// );
///
/// engine.trigger("[count]");
/// engine.trigger("[other]");
/// assert_eq!(*runs.borrow(), 2);
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Create an engine with the default configuration.
    ///
    /// The engine has no scheduler: async flushes run when
    /// [`complete_effects`](Self::complete_effects) is awaited or
    /// [`flush_effects`](Self::flush_effects) is called. This works with or
    /// without a tokio runtime.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration and no scheduler.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(config, None)
    }

    /// Create an engine that also hands each async flush to `scheduler`, so
    /// it runs without being awaited.
    ///
    /// Pass a [`LocalTaskScheduler`](super::LocalTaskScheduler) to flush on
    /// the current tokio `LocalSet`.
    pub fn with_scheduler(config: EngineConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::build(config, Some(scheduler))
    }

    fn build(config: EngineConfig, scheduler: Option<Rc<dyn Scheduler>>) -> Self {
        Self {
            inner: Rc::new(EngineInner {
                state: RefCell::new(EngineState::default()),
                config,
                scheduler,
            }),
        }
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Run `func` now and again whenever state it read is written.
    ///
    /// Uses the engine's default trigger mode.
    pub fn effect<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.effect_with(func, EffectOptions::default());
    }

    /// Like [`effect`](Self::effect), with explicit options.
    ///
    /// Called while another frame of this engine is executing, the new frame
    /// becomes that frame's child and is destroyed when the parent re-runs.
    pub fn effect_with<F>(&self, func: F, options: EffectOptions)
    where
        F: Fn() + 'static,
    {
        let mode = options.resolve(&self.inner.config);
        let func: FrameFn = Rc::new(func);
        let id = self.inner.create_frame(func.clone(), mode);
        self.inner.capture(id, &func);
    }

    /// Report a read of `path`.
    ///
    /// Recorded into the active frame's read-set and, when an ambient capture
    /// is in progress, into the ambient capture as well. A no-op otherwise.
    pub fn register(&self, path: &str) {
        self.inner.register(path);
        ambient::record(self, path);
    }

    /// Report a write of `path`. Must be called after the value changed.
    ///
    /// Sync subscribers re-run before this returns. Async subscribers run in
    /// the next flush, which is scheduled if none is pending.
    pub fn trigger(&self, path: &str) {
        let immediate: Option<Vec<FrameId>> = self
            .inner
            .state
            .borrow()
            .sync_triggers
            .get(path)
            .map(|ids| ids.iter().copied().collect());

        if let Some(ids) = immediate {
            debug!(path, frames = ids.len(), "running sync triggers");
            self.inner.execute_frames(ids);
        }

        let generation = {
            let mut state = self.inner.state.borrow_mut();
            if !state.async_triggers.contains_key(path) {
                None
            } else {
                state.queued_paths.insert(path.to_owned());
                state.queue_flush()
            }
        };

        if let Some(generation) = generation {
            self.schedule_flush(generation);
        }
    }

    fn schedule_flush(&self, generation: u64) {
        let Some(scheduler) = &self.inner.scheduler else {
            debug!(generation, "async flush pending");
            return;
        };

        debug!(generation, "scheduling async flush");
        let engine = Rc::downgrade(&self.inner);
        scheduler.schedule(Box::new(move || {
            if let Some(inner) = engine.upgrade() {
                inner.run_flush(generation);
            }
        }));
    }

    /// Resolves once the flush pending at call time (if any) has run.
    ///
    /// If the scheduler has not run that flush by the time the future is
    /// polled, the future runs it. The output is `true` if a flush was
    /// pending, `false` if there was nothing to wait for. The returned future
    /// does not borrow the engine.
    pub fn complete_effects(&self) -> impl Future<Output = bool> + 'static {
        let pending = self.inner.state.borrow().pending_flush;
        let engine = Rc::downgrade(&self.inner);
        async move {
            let Some(generation) = pending else {
                return false;
            };
            if let Some(inner) = engine.upgrade() {
                inner.run_flush(generation);
            }
            true
        }
    }

    /// Run the pending async flush now. Returns `false` if none was pending.
    pub fn flush_effects(&self) -> bool {
        let pending = self.inner.state.borrow().pending_flush;
        match pending {
            Some(generation) => {
                self.inner.run_flush(generation);
                true
            }
            None => false,
        }
    }

    /// Register a frame from paths captured by an ambient effect.
    ///
    /// The frame is not executed; it is subscribed to `paths` directly and
    /// always uses [`TriggerMode::Async`].
    pub(crate) fn add_ambient_capture(&self, func: FrameFn, paths: IndexSet<String>) {
        let id = self.inner.create_frame(func, TriggerMode::Async);
        debug!(frame = %id, paths = paths.len(), "registered ambient frame");
        self.inner.subscribe(id, &paths);
    }

    /// Whether an async flush is queued and has not started yet.
    pub fn has_pending_flush(&self) -> bool {
        self.inner.state.borrow().pending_flush.is_some()
    }

    /// The frame currently executing, if any.
    pub fn active_frame(&self) -> Option<FrameId> {
        self.inner.state.borrow().active_frame
    }

    /// Number of live frames.
    pub fn frame_count(&self) -> usize {
        self.inner.state.borrow().frames.len()
    }

    /// Frames subscribed to `path` in the given mode, in subscription order.
    pub fn subscribers(&self, path: &str, mode: TriggerMode) -> Vec<FrameId> {
        self.inner
            .state
            .borrow()
            .triggers(mode)
            .get(path)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether both handles refer to the same engine.
    pub fn ptr_eq(&self, other: &Engine) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Rc::downgrade(&self.inner))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.try_borrow();
        let mut debug = f.debug_struct("Engine");
        debug.field("config", &self.inner.config);
        if let Ok(state) = state {
            debug
                .field("frames", &state.frames.len())
                .field("active_frame", &state.active_frame)
                .field("pending_flush", &state.pending_flush);
        }
        debug.finish()
    }
}

/// Non-owning reference to an [`Engine`].
#[derive(Clone)]
pub(crate) struct WeakEngine(Weak<EngineInner>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Option<Engine> {
        self.0.upgrade().map(|inner| Engine { inner })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::ManualScheduler;
    use futures_util::FutureExt;
    use std::cell::Cell;

    fn manual() -> (Engine, Rc<ManualScheduler>) {
        let scheduler = Rc::new(ManualScheduler::new());
        let engine = Engine::with_scheduler(EngineConfig::default(), scheduler.clone());
        (engine, scheduler)
    }

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        (count.clone(), count)
    }

    #[test]
    fn register_outside_frame_is_noop() {
        let (engine, _) = manual();
        engine.register("[foo]");

        assert!(engine.subscribers("[foo]", TriggerMode::Async).is_empty());
        assert_eq!(engine.active_frame(), None);
    }

    #[test]
    fn effect_runs_once_and_subscribes_read_paths() {
        let (engine, _) = manual();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();

        engine.effect(move || {
            tracked.register("[a]");
            tracked.register("[b]");
            runs_clone.set(runs_clone.get() + 1);
        });

        assert_eq!(runs.get(), 1);
        assert_eq!(engine.frame_count(), 1);
        assert_eq!(engine.subscribers("[a]", TriggerMode::Async).len(), 1);
        assert_eq!(engine.subscribers("[b]", TriggerMode::Async).len(), 1);
        assert!(engine.subscribers("[a]", TriggerMode::Sync).is_empty());
    }

    #[test]
    fn trigger_unread_path_is_noop() {
        let (engine, scheduler) = manual();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();

        engine.effect(move || {
            tracked.register("[a]");
            runs_clone.set(runs_clone.get() + 1);
        });

        engine.trigger("[z]");

        assert!(!engine.has_pending_flush());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn sync_frame_reruns_inline() {
        let (engine, scheduler) = manual();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();

        engine.effect_with(
            move || {
                tracked.register("[a]");
                runs_clone.set(runs_clone.get() + 1);
            },
            EffectOptions::sync(),
        );

        engine.trigger("[a]");
        engine.trigger("[a]");

        assert_eq!(runs.get(), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn async_writes_coalesce_into_one_flush() {
        let (engine, scheduler) = manual();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();

        engine.effect(move || {
            tracked.register("[a]");
            tracked.register("[b]");
            runs_clone.set(runs_clone.get() + 1);
        });

        engine.trigger("[a]");
        engine.trigger("[a]");
        engine.trigger("[b]");

        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert!(engine.has_pending_flush());

        scheduler.run_until_idle();

        assert_eq!(runs.get(), 2);
        assert!(!engine.has_pending_flush());
        // Resubscribed after the re-run
        assert_eq!(engine.subscribers("[a]", TriggerMode::Async).len(), 1);
    }

    #[test]
    fn complete_effects_waits_for_scheduled_flush() {
        let (engine, scheduler) = manual();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();
        engine.effect(move || {
            tracked.register("[a]");
            runs_clone.set(runs_clone.get() + 1);
        });

        assert_eq!(engine.complete_effects().now_or_never(), Some(false));

        engine.trigger("[a]");
        let waiting = engine.complete_effects();
        scheduler.run_until_idle();
        assert_eq!(runs.get(), 2);

        // Already flushed by the scheduler; nothing runs twice.
        assert_eq!(waiting.now_or_never(), Some(true));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn complete_effects_drives_unscheduled_flush() {
        let (engine, scheduler) = manual();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();
        engine.effect(move || {
            tracked.register("[a]");
            runs_clone.set(runs_clone.get() + 1);
        });

        engine.trigger("[a]");
        assert_eq!(engine.complete_effects().now_or_never(), Some(true));
        assert_eq!(runs.get(), 2);
        assert!(!engine.has_pending_flush());

        // The queued task is now stale.
        assert_eq!(scheduler.run_until_idle(), 1);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn engine_without_scheduler_flushes_on_demand() {
        let engine = Engine::new();
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();
        engine.effect(move || {
            tracked.register("[a]");
            runs_clone.set(runs_clone.get() + 1);
        });

        engine.trigger("[a]");
        engine.trigger("[a]");
        assert_eq!(runs.get(), 1);
        assert!(engine.has_pending_flush());

        assert!(engine.flush_effects());
        assert_eq!(runs.get(), 2);
        assert!(!engine.flush_effects());
    }

    #[test]
    fn frame_under_destroyed_parent_is_not_registered() {
        let (engine, _) = manual();
        let armed = Rc::new(Cell::new(false));
        let outer_engine = engine.clone();
        let outer_armed = armed.clone();

        engine.effect_with(
            move || {
                outer_engine.register("[a]");
                let inner_engine = outer_engine.clone();
                let inner_armed = outer_armed.clone();
                outer_engine.effect_with(
                    move || {
                        inner_engine.register("[inner]");
                        // Re-runs the outer frame, which destroys this one.
                        if inner_armed.replace(false) {
                            inner_engine.trigger("[a]");
                        }
                        let leaf_engine = inner_engine.clone();
                        inner_engine.effect_with(move || leaf_engine.register("[leaf]"), EffectOptions::sync());
                    },
                    EffectOptions::sync(),
                );
            },
            EffectOptions::sync(),
        );
        assert_eq!(engine.frame_count(), 3);

        armed.set(true);
        engine.trigger("[inner]");

        assert_eq!(engine.frame_count(), 3);
        assert_eq!(engine.subscribers("[leaf]", TriggerMode::Sync).len(), 1);
        assert_eq!(engine.subscribers("[inner]", TriggerMode::Sync).len(), 1);
    }

    #[test]
    fn rerun_destroys_stale_children() {
        let (engine, _) = manual();
        let (inner_runs, inner_clone) = counter();
        let outer_engine = engine.clone();

        engine.effect_with(
            move || {
                outer_engine.register("[outer]");
                let inner_engine = outer_engine.clone();
                let inner_runs = inner_clone.clone();
                outer_engine.effect_with(
                    move || {
                        inner_engine.register("[inner]");
                        inner_runs.set(inner_runs.get() + 1);
                    },
                    EffectOptions::sync(),
                );
            },
            EffectOptions::sync(),
        );

        assert_eq!(engine.frame_count(), 2);
        let first_inner = engine.subscribers("[inner]", TriggerMode::Sync);

        engine.trigger("[outer]");

        assert_eq!(engine.frame_count(), 2);
        let second_inner = engine.subscribers("[inner]", TriggerMode::Sync);
        assert_eq!(second_inner.len(), 1);
        assert_ne!(first_inner, second_inner);

        engine.trigger("[inner]");
        assert_eq!(inner_runs.get(), 3);
    }

    #[test]
    fn ancestor_subscription_supersedes_child() {
        let (engine, _) = manual();
        let outer_engine = engine.clone();

        engine.effect_with(
            move || {
                outer_engine.register("[shared]");
                let inner_engine = outer_engine.clone();
                outer_engine.effect_with(
                    move || inner_engine.register("[shared]"),
                    EffectOptions::sync(),
                );
            },
            EffectOptions::sync(),
        );

        // Only the outer frame is subscribed; it recreates the inner one.
        let subscribers = engine.subscribers("[shared]", TriggerMode::Sync);
        assert_eq!(subscribers.len(), 1);
        assert!(engine.inner.state.borrow().hierarchy.ancestors(subscribers[0]).unwrap().is_empty());
    }

    #[test]
    fn clearing_removes_sync_and_async_subscriptions() {
        let (engine, scheduler) = manual();
        let outer_engine = engine.clone();

        engine.effect(move || {
            outer_engine.register("[outer]");
            let inner_engine = outer_engine.clone();
            outer_engine.effect_with(move || inner_engine.register("[inner]"), EffectOptions::sync());
        });

        let stale = engine.subscribers("[inner]", TriggerMode::Sync);
        engine.trigger("[outer]");
        scheduler.run_until_idle();

        let fresh = engine.subscribers("[inner]", TriggerMode::Sync);
        assert_eq!(fresh.len(), 1);
        assert!(!fresh.contains(&stale[0]));
    }

    #[test]
    fn panicking_frame_restores_active_frame() {
        use std::panic::{self, AssertUnwindSafe};

        let (engine, _) = manual();
        let tracked = engine.clone();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.effect(move || {
                tracked.register("[a]");
                panic!("effect failed");
            });
        }));

        assert!(result.is_err());
        assert_eq!(engine.active_frame(), None);

        // The engine keeps working afterwards
        let (runs, runs_clone) = counter();
        let tracked = engine.clone();
        engine.effect_with(
            move || {
                tracked.register("[b]");
                runs_clone.set(runs_clone.get() + 1);
            },
            EffectOptions::sync(),
        );
        engine.trigger("[b]");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn write_during_flush_schedules_next_flush() {
        let (engine, scheduler) = manual();
        let (b_runs, b_clone) = counter();

        let writer = engine.clone();
        engine.effect(move || {
            writer.register("[a]");
            writer.trigger("[b]");
        });
        let reader = engine.clone();
        engine.effect(move || {
            reader.register("[b]");
            b_clone.set(b_clone.get() + 1);
        });

        // The writer ran before the reader existed
        assert_eq!(scheduler.pending(), 0);

        engine.trigger("[a]");
        scheduler.run_until_idle();

        assert_eq!(b_runs.get(), 2);
        assert!(!engine.has_pending_flush());
    }
}
