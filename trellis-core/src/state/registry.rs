//! Wrapper Memoization
//!
//! Every object reachable from tracked state is wrapped at most once. The
//! first wrap fixes the object's engine and path; later reads of the same
//! object, from anywhere, reuse them. Entries hold the object and engine
//! weakly, so the table never keeps either alive. Dead entries are pruned
//! lazily when the table grows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::{Object, WeakObject};
use super::State;
use crate::reactive::{Engine, WeakEngine};

const MIN_PRUNE_AT: usize = 64;

thread_local! {
    static WRAPPED: RefCell<WrapTable> = RefCell::new(WrapTable::default());
}

struct Wrapped {
    object: WeakObject,
    engine: WeakEngine,
    path: Rc<str>,
}

struct WrapTable {
    entries: HashMap<usize, Wrapped>,
    prune_at: usize,
}

impl Default for WrapTable {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            prune_at: MIN_PRUNE_AT,
        }
    }
}

impl WrapTable {
    fn lookup(&mut self, object: &Object) -> Option<State> {
        let identity = object.identity();
        let entry = self.entries.get(&identity)?;

        // The weak handle pins the allocation, so a live entry under this
        // address is this object. Either side may have been dropped, though.
        let live = entry
            .object
            .upgrade()
            .and_then(|_| entry.engine.upgrade());

        match live {
            Some(engine) => Some(State::new(engine, object.clone(), entry.path.clone())),
            None => {
                self.entries.remove(&identity);
                None
            }
        }
    }

    fn insert(&mut self, object: &Object, engine: &Engine, path: Rc<str>) {
        if self.entries.len() >= self.prune_at {
            self.entries
                .retain(|_, entry| entry.object.is_alive() && entry.engine.upgrade().is_some());
            self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_AT);
        }

        self.entries.insert(
            object.identity(),
            Wrapped {
                object: object.downgrade(),
                engine: engine.downgrade(),
                path,
            },
        );
    }
}

/// The existing wrapper of `object`, if it was wrapped before.
pub(crate) fn lookup(object: &Object) -> Option<State> {
    WRAPPED.with(|table| table.borrow_mut().lookup(object))
}

/// Wrap `object` at `path` under `engine`, unless it is already wrapped.
pub(crate) fn wrap(engine: &Engine, object: Object, path: &str) -> State {
    WRAPPED.with(|table| {
        let mut table = table.borrow_mut();
        if let Some(existing) = table.lookup(&object) {
            return existing;
        }

        let path: Rc<str> = Rc::from(path);
        table.insert(&object, engine, path.clone());
        State::new(engine.clone(), object, path)
    })
}

#[cfg(test)]
fn len() -> usize {
    WRAPPED.with(|table| table.borrow().entries.len())
}
