//! The cancellable future at the center of every interactive step.
//!
//! DESIGN
//! ======
//! An `Operation<T>` is a shared handle (`Rc`) over a single-settlement slot.
//! It is built from a factory that receives a [`Settler`] and returns the
//! [`Hooks`] used on the way out: `dispose` (cleanup, run exactly once on
//! every exit path, including natural settlement) and `finish` (what a
//! program-driven "done" means for this step, usually resolving).
//!
//! Three verbs end an operation early:
//! - `cancel` rejects with [`OperationError::Cancelled`].
//! - `finish` runs the finish override if installed, else the finish hook.
//! - `interrupt` runs the interrupt override if installed, else the finish
//!   hook, so a preempted top-level step counts as gracefully done.
//!
//! The first verb wins; later verbs are ignored. A cancel settles before its
//! dispose hook runs, so settlements attempted during that cleanup are
//! dropped. Listeners registered with
//! [`Operation::on_settle`] run synchronously at settlement, which is what
//! lets [`Operation::all`] contain partial failures inside one event dispatch.
//!
//! TRADE-OFFS
//! ==========
//! Outcomes are cloned for every observer, so `T: Clone`. Interactive steps
//! produce `()` or small values, which keeps this cheap.

#[cfg(test)]
#[path = "operation_test.rs"]
mod operation_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};

use futures::future::LocalBoxFuture;

use crate::error::{OperationError, OperationId};
use crate::registrar::Registrable;
use crate::state::State;

type Outcome<T> = Result<T, OperationError>;
type Listener<T> = Box<dyn FnOnce(&Outcome<T>)>;
type Override<T> = Box<dyn FnOnce(&Settler<T>)>;

/// Cleanup and natural-completion hooks returned by an operation factory.
pub struct Hooks {
    dispose: Box<dyn FnOnce()>,
    finish: Box<dyn FnOnce()>,
}

impl Hooks {
    pub fn new(dispose: impl FnOnce() + 'static, finish: impl FnOnce() + 'static) -> Self {
        Self { dispose: Box::new(dispose), finish: Box::new(finish) }
    }

    /// Hooks for an operation with nothing to clean up and no finish behavior.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| {}, || {})
    }
}

struct Inner<T> {
    id: OperationId,
    state: State,
    outcome: Option<Outcome<T>>,
    dispose: Option<Box<dyn FnOnce()>>,
    finish: Option<Box<dyn FnOnce()>>,
    on_finish: Option<Override<T>>,
    on_interrupt: Option<Override<T>>,
    listeners: Vec<Listener<T>>,
    wakers: Vec<Waker>,
    observed: bool,
}

impl<T> Inner<T> {
    fn new(id: OperationId) -> Self {
        Self {
            id,
            state: State::None,
            outcome: None,
            dispose: None,
            finish: None,
            on_finish: None,
            on_interrupt: None,
            listeners: Vec::new(),
            wakers: Vec::new(),
            observed: false,
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            tracing::debug!(operation = %self.id, "pending operation dropped; disposing");
            dispose();
        }
        if let Some(Err(err)) = &self.outcome {
            if !self.observed {
                tracing::warn!(operation = %self.id, error = %err, "operation rejected with no handler attached");
            }
        }
    }
}

/// Settles the operation it was handed to. Holds only a weak reference, so
/// hooks and listeners that capture it never keep the operation alive.
pub struct Settler<T> {
    id: OperationId,
    inner: Weak<RefCell<Inner<T>>>,
}

impl<T> Clone for Settler<T> {
    fn clone(&self) -> Self {
        Self { id: self.id, inner: Weak::clone(&self.inner) }
    }
}

impl<T: Clone + 'static> Settler<T> {
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn resolve(&self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(&self, error: OperationError) {
        self.settle(Err(error));
    }

    /// Reject with [`OperationError::Failed`] originating from this operation.
    pub fn fail(&self, reason: impl Into<String>) {
        self.reject(OperationError::Failed { origin: self.id, reason: reason.into() });
    }

    /// Whether the operation has settled or no longer exists.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.upgrade().is_none_or(|inner| inner.borrow().outcome.is_some())
    }

    fn settle(&self, outcome: Outcome<T>) {
        if let Some(inner) = self.inner.upgrade() {
            settle(&inner, outcome);
        }
    }
}

fn settle<T: Clone>(inner: &Rc<RefCell<Inner<T>>>, outcome: Outcome<T>) {
    let (dispose, listeners, wakers) = {
        let mut i = inner.borrow_mut();
        if i.outcome.is_some() {
            tracing::trace!(operation = %i.id, "already settled; outcome ignored");
            return;
        }
        if i.state == State::None {
            i.state = match &outcome {
                Ok(_) => State::Finished,
                Err(err) => err.terminal_state(),
            };
        }
        tracing::trace!(operation = %i.id, ok = outcome.is_ok(), "operation settled");
        i.outcome = Some(outcome.clone());
        (i.dispose.take(), std::mem::take(&mut i.listeners), std::mem::take(&mut i.wakers))
    };
    if let Some(dispose) = dispose {
        dispose();
    }
    for listener in listeners {
        listener(&outcome);
    }
    for waker in wakers {
        waker.wake();
    }
}

/// A pending interactive unit of work with three terminal verbs.
pub struct Operation<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Operation")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("settled", &inner.outcome.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> Operation<T> {
    /// Start an operation. The factory runs immediately.
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce(Settler<T>) -> Hooks,
    {
        let id = OperationId::next();
        let inner = Rc::new(RefCell::new(Inner::new(id)));
        let hooks = factory(Settler { id, inner: Rc::downgrade(&inner) });

        // The factory may have settled synchronously; cleanup still runs once.
        let settled_early = {
            let mut i = inner.borrow_mut();
            i.finish = Some(hooks.finish);
            if i.outcome.is_some() {
                Some(hooks.dispose)
            } else {
                i.dispose = Some(hooks.dispose);
                None
            }
        };
        if let Some(dispose) = settled_early {
            dispose();
        }
        Self { inner }
    }

    /// An operation that has already finished with `value`.
    pub fn resolve(value: T) -> Self {
        Self::new(move |settler| {
            settler.resolve(value);
            Hooks::noop()
        })
    }

    /// Combine operations into one that settles with the first of them.
    ///
    /// Success of any constituent resolves the aggregate and a rejection
    /// rejects it; either way every constituent still pending is cancelled
    /// exactly once. Finishing the aggregate resolves it and cancels every
    /// constituent. Cancellations caused by that cleanup never replace the
    /// reason the aggregate settled with.
    #[must_use]
    pub fn all(operations: &[Operation<T>]) -> Operation<()> {
        Operation::new(|settler: Settler<()>| {
            let aggregate = Rc::new(Aggregate { disposed: Cell::new(false), members: operations.to_vec() });
            for member in operations {
                let weak = Rc::downgrade(&aggregate);
                let settler = settler.clone();
                member.on_settle(move |outcome| {
                    let Some(aggregate) = weak.upgrade() else {
                        return;
                    };
                    match outcome {
                        Err(err) if err.is_cancel() && aggregate.disposed.get() => {}
                        Ok(_) => {
                            aggregate.dispose();
                            settler.resolve(());
                        }
                        Err(err) => {
                            aggregate.dispose();
                            settler.reject(err.clone());
                        }
                    }
                });
            }
            let finisher = settler.clone();
            Hooks::new(move || aggregate.dispose(), move || finisher.resolve(()))
        })
    }

    #[must_use]
    pub fn id(&self) -> OperationId {
        self.inner.borrow().id
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.borrow().outcome.is_some()
    }

    /// The outcome, if settled. Does not count as handling a rejection.
    #[must_use]
    pub fn peek(&self) -> Option<Outcome<T>> {
        self.inner.borrow().outcome.clone()
    }

    /// Reject with [`OperationError::Cancelled`], disposing before any
    /// listener runs.
    ///
    /// The rejection is recorded before the dispose hook runs, so a dispose
    /// hook that settles through a [`Settler`] cannot turn the cancel into a
    /// success.
    pub fn cancel(&self) {
        let origin = {
            let mut i = self.inner.borrow_mut();
            if i.state != State::None {
                return;
            }
            i.state = State::Cancelled;
            i.id
        };
        tracing::debug!(operation = %origin, "cancel");
        settle(&self.inner, Err(OperationError::Cancelled { origin }));
    }

    /// Complete early: dispose, then run the finish override or hook.
    pub fn finish(&self) {
        let Some(dispose) = self.begin_terminal(State::Finished) else {
            return;
        };
        tracing::debug!(operation = %self.id(), "finish");
        if let Some(dispose) = dispose {
            dispose();
        }
        let (custom, finish) = {
            let mut i = self.inner.borrow_mut();
            (i.on_finish.take(), i.finish.take())
        };
        match custom {
            Some(custom) => custom(&self.settler()),
            None => {
                if let Some(finish) = finish {
                    finish();
                }
            }
        }
    }

    /// Preempt: dispose, then run the interrupt override or the finish hook.
    pub fn interrupt(&self) {
        let Some(dispose) = self.begin_terminal(State::Interrupted) else {
            return;
        };
        tracing::debug!(operation = %self.id(), "interrupt");
        if let Some(dispose) = dispose {
            dispose();
        }
        let (custom, finish) = {
            let mut i = self.inner.borrow_mut();
            (i.on_interrupt.take(), i.finish.take())
        };
        match custom {
            Some(custom) => custom(&self.settler()),
            None => {
                if let Some(finish) = finish {
                    finish();
                }
            }
        }
    }

    /// Replace what `finish` does after disposal.
    #[must_use]
    pub fn on_finish(self, hook: impl FnOnce(&Settler<T>) + 'static) -> Self {
        self.inner.borrow_mut().on_finish = Some(Box::new(hook));
        self
    }

    /// Replace what `interrupt` does after disposal.
    #[must_use]
    pub fn on_interrupt(self, hook: impl FnOnce(&Settler<T>) + 'static) -> Self {
        self.inner.borrow_mut().on_interrupt = Some(Box::new(hook));
        self
    }

    /// Make `interrupt` reject with [`OperationError::Interrupted`].
    #[must_use]
    pub fn reject_on_interrupt(self) -> Self {
        self.on_interrupt(|settler| settler.reject(OperationError::Interrupted { origin: settler.id() }))
    }

    /// Make `finish` reject with [`OperationError::Finished`].
    #[must_use]
    pub fn reject_on_finish(self) -> Self {
        self.on_finish(|settler| settler.reject(OperationError::Finished { origin: settler.id() }))
    }

    /// Run `listener` at settlement, or now if already settled.
    pub fn on_settle(&self, listener: impl FnOnce(&Outcome<T>) + 'static) {
        let settled = {
            let mut i = self.inner.borrow_mut();
            i.observed = true;
            i.outcome.clone()
        };
        match settled {
            Some(outcome) => listener(&outcome),
            None => self.inner.borrow_mut().listeners.push(Box::new(listener)),
        }
    }

    /// Callback-style chaining: one of the two closures runs at settlement.
    pub fn then(&self, on_fulfilled: impl FnOnce(T) + 'static, on_rejected: impl FnOnce(OperationError) + 'static) {
        self.on_settle(move |outcome| match outcome {
            Ok(value) => on_fulfilled(value.clone()),
            Err(err) => on_rejected(err.clone()),
        });
    }

    /// Derive an operation whose value is `f` of this one's.
    ///
    /// Finishing the derived operation finishes this one; rejections pass
    /// through unchanged. Other verbs only settle the derived operation.
    pub fn map<U, F>(&self, f: F) -> Operation<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> U + 'static,
    {
        let source = self.clone();
        Operation::new(move |settler| {
            source.on_settle(move |outcome| match outcome {
                Ok(value) => settler.resolve(f(value.clone())),
                Err(err) => settler.reject(err.clone()),
            });
            Hooks::new(|| {}, move || source.finish())
        })
    }

    /// Mark any rejection as handled so dropping it stays quiet.
    pub fn ignore_rejection(&self) {
        self.inner.borrow_mut().observed = true;
    }

    fn settler(&self) -> Settler<T> {
        Settler { id: self.id(), inner: Rc::downgrade(&self.inner) }
    }

    fn begin_terminal(&self, state: State) -> Option<Option<Box<dyn FnOnce()>>> {
        let mut i = self.inner.borrow_mut();
        if i.state != State::None {
            return None;
        }
        i.state = state;
        Some(i.dispose.take())
    }
}

impl<T: Clone> Future for Operation<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.borrow_mut();
        inner.observed = true;
        if let Some(outcome) = &inner.outcome {
            return Poll::Ready(outcome.clone());
        }
        if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            inner.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T: Clone + 'static> Registrable for Operation<T> {
    fn cancel(&self) {
        Operation::cancel(self);
    }

    fn finish(&self) {
        Operation::finish(self);
    }

    fn interrupt(&self) {
        Operation::interrupt(self);
    }

    fn ignore_rejection(&self) {
        Operation::ignore_rejection(self);
    }

    fn completion(&self) -> Option<LocalBoxFuture<'static, Result<(), OperationError>>> {
        use futures::FutureExt;
        let op = self.clone();
        Some(async move { op.await.map(|_| ()) }.boxed_local())
    }
}

struct Aggregate<T> {
    disposed: Cell<bool>,
    members: Vec<Operation<T>>,
}

impl<T: Clone + 'static> Aggregate<T> {
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        for member in &self.members {
            member.ignore_rejection();
            member.cancel();
        }
    }
}
