//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use trellis_core::state::State;

/// An append-only log shared between a test and its effects.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Read a string property, tracking the read. Missing values log as `-`.
pub fn read(state: &State, key: &str) -> String {
    state.get(key).as_str().unwrap_or("-").to_owned()
}

/// Drive `future` on a `LocalSet`, which `LocalTaskScheduler` requires.
pub async fn local<F: Future>(future: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(future).await
}
