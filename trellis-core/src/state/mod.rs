//! Tracked State
//!
//! The state layer turns plain reads and writes on an object graph into the
//! path reports the engine understands. [`reactive`] wraps a root object and
//! creates its engine; nested objects are wrapped lazily on first read and
//! share the root's engine.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::state::{reactive, Object};
//! use trellis_core::EffectOptions;
//!
//! let (state, engine) = reactive(Object::new().with("count", 1));
//!
//! let view = state.clone();
//! engine.effect_with(
//!     move || println!("count = {:?}", view.get("count").as_f64()),
//!     EffectOptions::sync(),
//! );
//!
//! state.set("count", 2); // prints "count = Some(2.0)"
//! ```

mod proxy;
mod registry;
mod value;

pub use proxy::{Access, State};
pub use value::{Callable, Fields, Object, Value, ValueKind};

use crate::reactive::Engine;

/// Wrap `object` as the root of a tracked state graph.
///
/// A fresh [`Engine`] with the default configuration is created. If the
/// object is already wrapped, its existing wrapper and engine are returned.
pub fn reactive(object: Object) -> (State, Engine) {
    if let Some(state) = registry::lookup(&object) {
        let engine = state.engine().clone();
        return (state, engine);
    }

    let engine = Engine::new();
    let state = registry::wrap(&engine, object, "");
    (state, engine)
}

/// Wrap `object` as a root tracked by `engine`.
///
/// If the object is already wrapped, the existing wrapper is returned, even
/// when it belongs to a different engine.
pub fn reactive_with(engine: &Engine, object: Object) -> State {
    registry::wrap(engine, object, "")
}
