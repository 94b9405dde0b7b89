//! Ownership tree for everything a command starts.
//!
//! DESIGN
//! ======
//! A `Registrar` owns an ordered list of [`Registrable`] resources (gizmos,
//! nested registrars, provisional geometry) and forwards its own terminal
//! verb to each of them in registration order. Cleanup registered through
//! [`Registrar::ensure`] runs after the cascade on every exit path.
//!
//! `interrupt` is special: in state `Awaiting` the owner has already
//! collected all of its input, so the cascade preempts the resources but the
//! registrar stays alive until the owner calls `finish`.
//!
//! TRADE-OFFS
//! ==========
//! Resource verbs and `ensure` cleanups run under `catch_unwind` so one
//! misbehaving resource cannot strand the others with live listeners or keep
//! the registrar from ending. The panic is logged, not rethrown.

#[cfg(test)]
#[path = "registrar_test.rs"]
mod registrar_test;

use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, try_join_all};

use crate::disposable::Disposable;
use crate::error::{OperationError, RegistrarError};
use crate::state::State;

/// A resource that can be owned by a [`Registrar`].
pub trait Registrable {
    fn cancel(&self);
    fn finish(&self);
    fn interrupt(&self);

    /// Called before `cancel` during a cascade; the owner will not observe
    /// the resulting rejection.
    fn ignore_rejection(&self) {}

    /// A future the owner's `finished()` waits on, if this resource has one.
    fn completion(&self) -> Option<LocalBoxFuture<'static, Result<(), OperationError>>> {
        None
    }
}

impl<R: Registrable + ?Sized> Registrable for Rc<R> {
    fn cancel(&self) {
        (**self).cancel();
    }

    fn finish(&self) {
        (**self).finish();
    }

    fn interrupt(&self) {
        (**self).interrupt();
    }

    fn ignore_rejection(&self) {
        (**self).ignore_rejection();
    }

    fn completion(&self) -> Option<LocalBoxFuture<'static, Result<(), OperationError>>> {
        (**self).completion()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Cancel,
    Finish,
    Interrupt,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Finish => "finish",
            Self::Interrupt => "interrupt",
        }
    }
}

struct Inner {
    state: State,
    cascading: bool,
    resources: Vec<Rc<dyn Registrable>>,
    completions: Vec<LocalBoxFuture<'static, Result<(), OperationError>>>,
    ensured: Vec<Disposable>,
}

/// Shared handle over one ownership scope. Clones refer to the same scope.
#[derive(Clone)]
pub struct Registrar {
    inner: Rc<RefCell<Inner>>,
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Registrar")
            .field("state", &inner.state)
            .field("resources", &inner.resources.len())
            .finish_non_exhaustive()
    }
}

impl Registrar {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: State::None,
                cascading: false,
                resources: Vec::new(),
                completions: Vec::new(),
                ensured: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().resources.is_empty()
    }

    /// Take ownership of `resource` and hand it back.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::AlreadyFinished`] after cancelling the
    /// resource if this registrar has already ended.
    pub fn register<R>(&self, resource: R) -> Result<R, RegistrarError>
    where
        R: Registrable + Clone + 'static,
    {
        let state = self.state();
        if state.is_terminal() {
            tracing::debug!(%state, "register on ended registrar; cancelling resource");
            resource.ignore_rejection();
            resource.cancel();
            return Err(RegistrarError::AlreadyFinished { state });
        }

        let completion = resource.completion();
        let mut inner = self.inner.borrow_mut();
        inner.resources.push(Rc::new(resource.clone()));
        if let Some(completion) = completion {
            inner.completions.push(completion);
        }
        Ok(resource)
    }

    /// Enter `Awaiting` and wait for every tracked operation to resolve.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::AlreadyFinished`] unless the state is `None`.
    /// The returned future rejects with the first operation rejection.
    pub fn finished(&self) -> Result<LocalBoxFuture<'static, Result<(), OperationError>>, RegistrarError> {
        let completions = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != State::None {
                return Err(RegistrarError::AlreadyFinished { state: inner.state });
            }
            inner.state = State::Awaiting;
            std::mem::take(&mut inner.completions)
        };
        tracing::trace!(tracked = completions.len(), "registrar awaiting");
        Ok(async move { try_join_all(completions).await.map(|_| ()) }.boxed_local())
    }

    /// Run `cleanup` once this registrar ends, whichever verb ends it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrarError::AlreadyFinished`] after running `cleanup`
    /// immediately if this registrar has already ended.
    pub fn ensure(&self, cleanup: impl FnOnce() + 'static) -> Result<(), RegistrarError> {
        let state = self.state();
        if state.is_terminal() {
            cleanup();
            return Err(RegistrarError::AlreadyFinished { state });
        }
        self.inner.borrow_mut().ensured.push(Disposable::new(cleanup));
        Ok(())
    }

    pub fn cancel(&self) {
        self.end(Verb::Cancel, State::Cancelled);
    }

    pub fn finish(&self) {
        self.end(Verb::Finish, State::Finished);
    }

    /// Preempt the owned resources. Ends the registrar only from `None`.
    pub fn interrupt(&self) {
        match self.state() {
            State::None => self.end(Verb::Interrupt, State::Interrupted),
            State::Awaiting => {
                if let Some(resources) = self.begin() {
                    cascade(&resources, Verb::Interrupt);
                    self.inner.borrow_mut().cascading = false;
                }
            }
            State::Cancelled | State::Finished | State::Interrupted => {}
        }
    }

    fn end(&self, verb: Verb, to: State) {
        let Some(resources) = self.begin() else {
            return;
        };
        tracing::debug!(verb = verb.as_str(), resources = resources.len(), "registrar ending");
        cascade(&resources, verb);
        loop {
            let cleanups = std::mem::take(&mut self.inner.borrow_mut().ensured);
            if cleanups.is_empty() {
                break;
            }
            for (index, mut cleanup) in cleanups.into_iter().enumerate() {
                if catch_unwind(AssertUnwindSafe(|| cleanup.dispose())).is_err() {
                    tracing::error!(verb = verb.as_str(), index, "ensure cleanup panicked");
                }
            }
        }
        let mut inner = self.inner.borrow_mut();
        inner.state = to;
        inner.cascading = false;
    }

    /// Snapshot the resources if a verb may run now.
    fn begin(&self) -> Option<Vec<Rc<dyn Registrable>>> {
        let mut inner = self.inner.borrow_mut();
        if inner.state.is_terminal() || inner.cascading {
            return None;
        }
        inner.cascading = true;
        Some(inner.resources.clone())
    }
}

fn cascade(resources: &[Rc<dyn Registrable>], verb: Verb) {
    for (index, resource) in resources.iter().enumerate() {
        let outcome = catch_unwind(AssertUnwindSafe(|| match verb {
            Verb::Cancel => {
                resource.ignore_rejection();
                resource.cancel();
            }
            Verb::Finish => resource.finish(),
            Verb::Interrupt => resource.interrupt(),
        }));
        if outcome.is_err() {
            tracing::error!(verb = verb.as_str(), index, "resource panicked during cascade");
        }
    }
}

impl Registrable for Registrar {
    fn cancel(&self) {
        Registrar::cancel(self);
    }

    fn finish(&self) {
        Registrar::finish(self);
    }

    fn interrupt(&self) {
        Registrar::interrupt(self);
    }
}
