//! Trellis Core
//!
//! This crate provides the reactive core of the Trellis UI toolkit.
//! It implements:
//!
//! - A path-based dependency tracking engine (frames, subscriptions, triggers)
//! - Nested frames with automatic teardown of stale children
//! - Sync and batched async re-execution
//! - Ambient effects that discover their engine from the state they read
//! - A tracked state layer that reports reads and writes as paths
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: The engine, frames, hierarchy and flush scheduling
//! - `state`: Tracked object graphs and path canonicalization
//! - `config`: Engine and effect options
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use trellis_core::state::{reactive, Object};
//!
//! let (state, engine) = reactive(Object::new().with("foo", "bar"));
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! // Create an effect; it runs once immediately
//! let (view, log) = (state.clone(), seen.clone());
//! engine.effect(move || {
//!     let foo = view.get("foo").as_str().unwrap_or_default().to_owned();
//!     log.borrow_mut().push(foo);
//! });
//!
//! // Write twice; the effect re-runs once, in the next flush
//! state.set("foo", "baz");
//! state.set("foo", "qux");
//! assert_eq!(*seen.borrow(), ["bar"]);
//!
//! // `engine.complete_effects().await` does the same from async code
//! assert!(engine.flush_effects());
//! assert_eq!(*seen.borrow(), ["bar", "qux"]);
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod state;

pub use config::{EffectOptions, EngineConfig};
pub use error::{ReactiveError, Result};
pub use reactive::{ambient_effect, Engine, FrameId, TriggerMode};
