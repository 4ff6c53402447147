//! Tracked State Access
//!
//! [`State`] is the accessor that sits between user code and an [`Object`].
//! Reads report their path to the engine before returning; writes store the
//! value and then report the same path as mutated. Paths are root-relative
//! concatenations of bracketed keys: `root.a.b` is `[a][b]`.

use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;

use super::registry;
use super::value::{Callable, Object, Value};
use crate::reactive::Engine;

/// The result of reading a property through a [`State`].
#[derive(Debug, Clone)]
pub enum Access {
    /// The key is not present.
    Undefined,
    /// A primitive value.
    Value(Value),
    /// A function, passed through untouched.
    Callable(Callable),
    /// An object, wrapped so reads below it are tracked.
    Nested(State),
}

impl Access {
    /// Whether the key was missing.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Access::Undefined)
    }

    /// The string, if a primitive string was read.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Access::Value(value) => value.as_str(),
            _ => None,
        }
    }

    /// The number, if a primitive number was read.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Access::Value(value) => value.as_f64(),
            _ => None,
        }
    }

    /// The boolean, if a primitive boolean was read.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Access::Value(value) => value.as_bool(),
            _ => None,
        }
    }

    /// The nested wrapper, if an object was read.
    pub fn into_state(self) -> Option<State> {
        match self {
            Access::Nested(state) => Some(state),
            _ => None,
        }
    }

    /// The function, if a callable was read.
    pub fn into_callable(self) -> Option<Callable> {
        match self {
            Access::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    /// The underlying value; `Undefined` becomes [`Value::Null`].
    pub fn into_value(self) -> Value {
        match self {
            Access::Undefined => Value::Null,
            Access::Value(value) => value,
            Access::Callable(callable) => Value::Callable(callable),
            Access::Nested(state) => Value::Object(state.object),
        }
    }
}

/// A tracked view of one object in a state graph.
///
/// All wrappers of a graph share the root's [`Engine`]. Cloning is cheap.
#[derive(Clone)]
pub struct State {
    engine: Engine,
    object: Object,
    path: Rc<str>,
}

impl State {
    pub(crate) fn new(engine: Engine, object: Object, path: Rc<str>) -> Self {
        Self {
            engine,
            object,
            path,
        }
    }

    /// The engine reads and writes are reported to.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// This object's path from the root (`""` for the root itself).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The wrapped object. Access through it is not tracked.
    pub fn object(&self) -> &Object {
        &self.object
    }

    fn child_path(&self, key: &str) -> String {
        format!("{}[{}]", self.path, key)
    }

    /// Read `key`, reporting the read to the engine.
    pub fn get(&self, key: &str) -> Access {
        let path = self.child_path(key);
        self.engine.register(&path);

        match self.object.get(key) {
            None => Access::Undefined,
            Some(Value::Callable(callable)) => Access::Callable(callable),
            Some(Value::Object(object)) => Access::Nested(registry::wrap(&self.engine, object, &path)),
            Some(primitive) => Access::Value(primitive),
        }
    }

    /// Write `key`, then report the write to the engine.
    ///
    /// Sync subscribers of the path re-run before this returns.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let path = self.child_path(key);
        self.object.insert(key, value);
        self.engine.trigger(&path);
    }

    /// Read `key` and call it if it is a function.
    pub fn call(&self, key: &str, args: &[Value]) -> Option<Value> {
        self.get(key).into_callable().map(|callable| callable.call(args))
    }

    /// Untracked JSON view of the wrapped object.
    pub fn snapshot(&self) -> Json {
        self.object.to_json()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("path", &self.path)
            .field("object", &self.object)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::TriggerMode;
    use crate::state::reactive;
    use crate::{EffectOptions, Engine};

    #[test]
    fn reads_primitive_values() {
        let (state, _) = reactive(Object::new().with("foo", "bar").with("n", 2));

        assert_eq!(state.get("foo").as_str(), Some("bar"));
        assert_eq!(state.get("n").as_f64(), Some(2.0));
        assert!(state.get("missing").is_undefined());
    }

    #[test]
    fn nested_objects_get_bracketed_paths() {
        let (state, _) = reactive(Object::new().with("nested", Object::new().with("foo", "bar")));

        let nested = state.get("nested").into_state().unwrap();
        assert_eq!(nested.path(), "[nested]");
        assert_eq!(nested.get("foo").as_str(), Some("bar"));
    }

    #[test]
    fn callables_pass_through() {
        let (state, _) = reactive(
            Object::new().with("greet", Callable::new(|_| Value::from("bar"))),
        );

        assert_eq!(state.call("greet", &[]), Some(Value::from("bar")));
        assert_eq!(state.call("missing", &[]), None);
    }

    #[test]
    fn reads_inside_effect_are_registered() {
        let (state, engine) = reactive(Object::new().with("nested", Object::new().with("foo", 1)));

        let tracked = state.clone();
        engine.effect(move || {
            let nested = tracked.get("nested").into_state().unwrap();
            nested.get("foo");
        });

        assert_eq!(engine.subscribers("[nested]", TriggerMode::Async).len(), 1);
        assert_eq!(engine.subscribers("[nested][foo]", TriggerMode::Async).len(), 1);
        assert!(engine.subscribers("[foo]", TriggerMode::Async).is_empty());
    }

    #[test]
    fn set_stores_before_triggering() {
        let engine = Engine::new();
        let state = crate::state::reactive_with(&engine, Object::new().with("foo", "bar"));
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let (tracked, log) = (state.clone(), seen.clone());
        engine.effect_with(
            move || {
                let value = tracked.get("foo").as_str().map(str::to_owned);
                log.borrow_mut().push(value);
            },
            EffectOptions::sync(),
        );

        state.set("foo", "baz");

        assert_eq!(
            *seen.borrow(),
            vec![Some("bar".to_owned()), Some("baz".to_owned())]
        );
        assert_eq!(state.snapshot(), serde_json::json!({ "foo": "baz" }));
    }
}
