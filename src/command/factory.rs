//! Provisional geometry owned by a command.
//!
//! The factory holds the parameters the command would build with right now
//! and, once the command ends, the parameters it actually committed. It is a
//! [`Registrable`]: `finish` and `interrupt` commit the provisional value,
//! `cancel` discards it. Only the first verb counts.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cancel::{Registrable, State};

struct FactoryInner<P> {
    name: &'static str,
    provisional: RefCell<Option<P>>,
    committed: RefCell<Option<P>>,
    state: Cell<State>,
}

/// Shared handle; clones refer to the same provisional geometry.
pub struct Factory<P> {
    inner: Rc<FactoryInner<P>>,
}

impl<P> Clone for Factory<P> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<P: Clone + std::fmt::Debug> Factory<P> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Rc::new(FactoryInner {
                name,
                provisional: RefCell::new(None),
                committed: RefCell::new(None),
                state: Cell::new(State::None),
            }),
        }
    }

    /// Replace the provisional parameters. Ignored once the factory has ended.
    pub fn update(&self, params: P) {
        if self.inner.state.get().is_terminal() {
            tracing::debug!(factory = self.inner.name, "update after end ignored");
            return;
        }
        *self.inner.provisional.borrow_mut() = Some(params);
    }

    #[must_use]
    pub fn provisional(&self) -> Option<P> {
        self.inner.provisional.borrow().clone()
    }

    #[must_use]
    pub fn committed(&self) -> Option<P> {
        self.inner.committed.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.inner.state.get()
    }

    fn end(&self, to: State) {
        if self.inner.state.get().is_terminal() {
            return;
        }
        self.inner.state.set(to);
        let provisional = self.inner.provisional.borrow_mut().take();
        if to == State::Cancelled {
            tracing::debug!(factory = self.inner.name, "provisional geometry discarded");
            return;
        }
        tracing::debug!(factory = self.inner.name, params = ?provisional, %to, "geometry committed");
        *self.inner.committed.borrow_mut() = provisional;
    }
}

impl<P: Clone + std::fmt::Debug> Registrable for Factory<P> {
    fn cancel(&self) {
        self.end(State::Cancelled);
    }

    fn finish(&self) {
        self.end(State::Finished);
    }

    fn interrupt(&self) {
        self.end(State::Interrupted);
    }
}
