//! Several gizmos editing one parameter struct.
//!
//! Each child gizmo contributes one field through its `apply` function. While
//! one child is being dragged the others are interrupted and deactivated, so
//! only one interaction runs at a time; they come back when it ends or is
//! interrupted. Interrupts of the deactivated siblings themselves do not
//! count: only the child holding focus releases it.

#[cfg(test)]
#[path = "composite_test.rs"]
mod composite_test;

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use cancel::{CompositeDisposable, Disposable, Hooks, Operation};

use crate::camera::Camera;
use crate::handle::GizmoHandle;
use crate::input::Mode;
use crate::machine::Signal;
use crate::strategy::Value;
use crate::viewport::{Helper, Viewport};

type Apply<P> = Rc<dyn Fn(&mut P, Value)>;

struct Child<P> {
    handle: GizmoHandle,
    apply: Apply<P>,
}

impl<P> Clone for Child<P> {
    fn clone(&self) -> Self {
        Self { handle: self.handle.clone(), apply: Rc::clone(&self.apply) }
    }
}

struct CompositeInner<P> {
    params: Rc<RefCell<P>>,
    viewport: Rc<Viewport>,
    children: RefCell<Vec<Child<P>>>,
    /// Child whose interaction deactivated the others.
    focus: Cell<Option<usize>>,
}

pub struct CompositeGizmo<P> {
    inner: Rc<CompositeInner<P>>,
}

impl<P: 'static> CompositeGizmo<P> {
    pub fn new(params: P, viewport: &Rc<Viewport>) -> Self {
        Self {
            inner: Rc::new(CompositeInner {
                params: Rc::new(RefCell::new(params)),
                viewport: Rc::clone(viewport),
                children: RefCell::new(Vec::new()),
                focus: Cell::new(None),
            }),
        }
    }

    /// Add a child whose values are merged into the parameters by `apply`.
    pub fn add_gizmo(&self, handle: GizmoHandle, apply: impl Fn(&mut P, Value) + 'static) {
        let index = self.inner.children.borrow().len();
        let weak: Weak<CompositeInner<P>> = Rc::downgrade(&self.inner);
        handle.observe(move |signal| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match signal {
                Signal::Start => inner.deactivate_except(index),
                Signal::End => inner.activate_all(),
                Signal::Interrupt if inner.focus.get() == Some(index) => inner.activate_all(),
                Signal::Enter | Signal::Leave | Signal::Interrupt => {}
            }
        });
        self.inner.children.borrow_mut().push(Child { handle, apply: Rc::new(apply) });
    }

    /// Run every child; `callback` sees the merged parameters after each change.
    ///
    /// The returned operation settles with the first child that settles.
    /// `teardown` runs with the composite's own cleanup. Interrupting it
    /// rolls every child back before resolving.
    pub fn execute(&self, callback: impl FnMut(&P) + 'static, mode: Mode, teardown: Disposable) -> Operation<()> {
        let callback: Rc<RefCell<dyn FnMut(&P)>> = Rc::new(RefCell::new(callback));
        let children = self.inner.children.borrow().clone();
        tracing::debug!(children = children.len(), ?mode, "composite executing");

        let mut operations = Vec::with_capacity(children.len() + 1);
        for child in &children {
            let params = Rc::clone(&self.inner.params);
            let callback = Rc::clone(&callback);
            let apply = Rc::clone(&child.apply);
            operations.push(child.handle.execute(
                move |value| {
                    apply(&mut params.borrow_mut(), value);
                    let snapshot = params.borrow();
                    let mut notify = callback.borrow_mut();
                    (*notify)(&snapshot);
                },
                mode,
            ));
        }

        let inner = Rc::clone(&self.inner);
        operations.push(Operation::new(move |_settler| {
            let mut disposables = CompositeDisposable::new();
            disposables.add(teardown);
            disposables.add(inner.viewport.add_helper(Rc::clone(&inner) as Rc<dyn Helper>));
            Hooks::new(move || disposables.dispose(), || {})
        }));

        let handles: Vec<GizmoHandle> = children.into_iter().map(|c| c.handle).collect();
        Operation::all(&operations).on_interrupt(move |settler| {
            for handle in &handles {
                handle.interrupt();
            }
            settler.resolve(());
        })
    }

    /// Interrupt and disable every child.
    pub fn disable(&self) {
        for handle in self.inner.handles() {
            handle.interrupt();
            handle.set_enabled(false);
        }
    }

    /// Enable every child and give pointer input back to all of them.
    pub fn enable(&self) {
        for handle in self.inner.handles() {
            handle.set_enabled(true);
        }
        self.inner.activate_all();
    }

    #[must_use]
    pub fn params(&self) -> Ref<'_, P> {
        self.inner.params.borrow()
    }

    #[must_use]
    pub fn handles(&self) -> Vec<GizmoHandle> {
        self.inner.handles()
    }
}

impl<P> CompositeInner<P> {
    fn handles(&self) -> Vec<GizmoHandle> {
        self.children.borrow().iter().map(|c| c.handle.clone()).collect()
    }

    fn deactivate_except(&self, index: usize) {
        self.focus.set(Some(index));
        for (i, handle) in self.handles().into_iter().enumerate() {
            if i == index {
                handle.set_active(true);
            } else {
                handle.interrupt();
                handle.set_active(false);
            }
        }
    }

    fn activate_all(&self) {
        self.focus.set(None);
        for handle in self.handles() {
            handle.set_active(true);
        }
    }
}

impl<P> Helper for CompositeInner<P> {
    fn update(&self, camera: &Camera) {
        for handle in self.handles() {
            handle.update(camera);
        }
    }
}

impl<P: 'static> Helper for CompositeGizmo<P> {
    fn update(&self, camera: &Camera) {
        self.inner.update(camera);
    }
}
