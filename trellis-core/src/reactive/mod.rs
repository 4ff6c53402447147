//! Reactive Engine
//!
//! This module implements path-based dependency tracking: computations
//! ("frames") re-run automatically when the state they read is written,
//! without declaring their dependencies up front.
//!
//! # Concepts
//!
//! ## Paths
//!
//! Every trackable location in state is named by a canonical path string
//! such as `[todos][3][done]`. The state layer reports reads with
//! [`Engine::register`] and writes with [`Engine::trigger`]; the engine only
//! ever sees these strings.
//!
//! ## Frames
//!
//! A frame wraps a function. While it runs, every reported read is captured;
//! afterwards the frame is subscribed to exactly those paths. Frames created
//! while another frame runs are its children, and are torn down and
//! recreated each time the parent re-runs.
//!
//! ## Trigger modes
//!
//! [`TriggerMode::Sync`] frames re-run inside `trigger`. [`TriggerMode::Async`]
//! frames are batched: all writes until the next flush (run by the scheduler
//! or by `complete_effects`) collapse into a single flush that runs each
//! affected frame at most once.
//!
//! ## Ambient effects
//!
//! [`ambient_effect`] tracks a function without an engine reference; the
//! engine is discovered from the state the function reads.

mod ambient;
mod context;
mod engine;
mod frame;
mod hierarchy;
mod scheduler;

pub use ambient::{ambient_effect, is_capturing};
pub use engine::Engine;
pub(crate) use engine::WeakEngine;
pub use frame::{FrameId, TriggerMode};
pub use scheduler::{LocalTaskScheduler, ManualScheduler, Scheduler, Task};
