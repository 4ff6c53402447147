//! State Values
//!
//! Tracked state is a graph of [`Object`]s holding [`Value`]s. Property
//! access dispatches on an explicit tag ([`ValueKind`]) rather than on the
//! runtime shape of the value:
//!
//! - primitives are returned by value,
//! - composites (objects) are returned wrapped so reads below them are
//!   tracked too,
//! - callables are returned as-is.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};

/// The fields of one object, in insertion order.
pub type Fields = IndexMap<String, Value>;

/// A shared, mutable object. Clones refer to the same object; identity is
/// the allocation, not the contents.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Fields>>);

impl Object {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Read a field without tracking.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Write a field without triggering. Returns the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Remove a field without triggering.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Build an object from a JSON object, recursively.
    pub fn from_json(map: Map<String, Json>) -> Self {
        let fields = map
            .into_iter()
            .map(|(key, value)| (key, Value::from_json(value)))
            .collect();
        Self(Rc::new(RefCell::new(fields)))
    }

    /// Plain JSON view of the object. Callables become `null`.
    ///
    /// The object graph must be acyclic.
    pub fn to_json(&self) -> Json {
        let map = self
            .0
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        Json::Object(map)
    }

    /// Address of the shared allocation, used as the identity key.
    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(fields) => f.debug_map().entries(fields.iter()).finish(),
            Err(_) => f.write_str("Object { <borrowed> }"),
        }
    }
}

/// Non-owning reference to an [`Object`].
#[derive(Clone)]
pub(crate) struct WeakObject(Weak<RefCell<Fields>>);

impl WeakObject {
    pub(crate) fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// A function stored in state.
#[derive(Clone)]
pub struct Callable(Rc<dyn Fn(&[Value]) -> Value>);

impl Callable {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self(Rc::new(func))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// How a value is treated on property access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Null, booleans, numbers and strings.
    Primitive,
    /// Objects; reads below them are tracked.
    Composite,
    /// Functions; passed through untouched.
    Callable,
}

/// A value held in tracked state.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(Object),
    Callable(Callable),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => ValueKind::Primitive,
            Value::Object(_) => ValueKind::Composite,
            Value::Callable(_) => ValueKind::Callable,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Convert from JSON. Objects become fresh [`Object`]s; arrays become
    /// objects keyed by index.
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            Json::String(s) => Value::String(s),
            Json::Array(items) => {
                let object = Object::new();
                for (index, item) in items.into_iter().enumerate() {
                    object.insert(index.to_string(), Value::from_json(item));
                }
                Value::Object(object)
            }
            Json::Object(map) => Value::Object(Object::from_json(map)),
        }
    }

    /// Plain JSON view. Callables and non-finite numbers become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null | Value::Callable(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Object(object) => object.to_json(),
        }
    }
}

/// Primitives compare by value; objects and callables by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Callable> for Value {
    fn from(value: Callable) -> Self {
        Value::Callable(value)
    }
}

impl From<Json> for Value {
    fn from(value: Json) -> Self {
        Value::from_json(value)
    }
}
