//! Running a gizmo as a cancellable operation.
//!
//! DESIGN
//! ======
//! `GizmoHandle::execute` wires a [`GizmoStateMachine`] into the viewport and
//! returns an [`Operation`] that owns the wiring:
//!
//! - the handle becomes a camera [`Helper`];
//! - each of the gizmo's keyboard commands is bound;
//! - a capture listener handles pointer-down and key presses, a bubble
//!   listener handles hover;
//! - a drag or modal command attaches document listeners for move and up,
//!   and disables camera controls, until the session ends.
//!
//! Disposing the operation resets the machine to `none` and removes all of
//! it, so a later `execute` starts from a clean machine.
//! Without [`Mode::PERSISTENT`] the operation resolves on the first commit.
//! Interrupting it rolls the gizmo back to its committed value, reports that
//! value to the callback, then resolves.
//!
//! Listener closures hold weak references, so the viewport never keeps a
//! handle alive on its own.

#[cfg(test)]
#[path = "handle_test.rs"]
mod handle_test;

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use cancel::{CompositeDisposable, Disposable, Hooks, Operation, Settler};

use crate::camera::Camera;
use crate::error::GizmoError;
use crate::gizmo::{CommandAction, Gizmo};
use crate::input::{InputEvent, Mode, PointerEvent};
use crate::machine::{GizmoStateMachine, Signal, StateTag, Transition};
use crate::strategy::Value;
use crate::viewport::{Helper, Phase, Viewport};

type Callback = Box<dyn FnMut(Value)>;
type Observer = Rc<dyn Fn(Signal)>;

struct HandleInner {
    machine: RefCell<GizmoStateMachine>,
    viewport: Rc<Viewport>,
    callback: RefCell<Option<Callback>>,
    observers: RefCell<Vec<Observer>>,
    settler: RefCell<Option<Settler<()>>>,
    mode: Cell<Mode>,
}

/// Shared handle to one gizmo and its state machine.
#[derive(Clone)]
pub struct GizmoHandle {
    inner: Rc<HandleInner>,
}

impl std::fmt::Debug for GizmoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GizmoHandle").field(&*self.inner.machine.borrow()).finish()
    }
}

impl GizmoHandle {
    #[must_use]
    pub fn new(gizmo: Gizmo, viewport: &Rc<Viewport>) -> Self {
        let machine = GizmoStateMachine::new(gizmo, Rc::clone(viewport));
        Self {
            inner: Rc::new(HandleInner {
                machine: RefCell::new(machine),
                viewport: Rc::clone(viewport),
                callback: RefCell::new(None),
                observers: RefCell::new(Vec::new()),
                settler: RefCell::new(None),
                mode: Cell::new(Mode::PERSISTENT),
            }),
        }
    }

    /// Wire the gizmo into the viewport; `callback` receives every value change.
    pub fn execute(&self, callback: impl FnMut(Value) + 'static, mode: Mode) -> Operation<()> {
        *self.inner.callback.borrow_mut() = Some(Box::new(callback));
        self.inner.mode.set(mode);
        self.inner.machine.borrow_mut().reset();
        let inner = Rc::clone(&self.inner);
        let name = inner.machine.borrow().gizmo().name().to_string();
        tracing::debug!(gizmo = %name, ?mode, "gizmo executing");

        let op = Operation::new(|settler: Settler<()>| {
            *inner.settler.borrow_mut() = Some(settler.clone());
            let mut disposables = inner.attach(mode);
            let teardown = Rc::clone(&inner);
            Hooks::new(
                move || {
                    teardown.machine.borrow_mut().reset();
                    disposables.dispose();
                    teardown.settler.borrow_mut().take();
                    tracing::trace!(gizmo = %name, "gizmo disposed");
                },
                move || settler.resolve(()),
            )
        });

        let rollback = Rc::downgrade(&self.inner);
        op.on_interrupt(move |settler| {
            if let Some(inner) = rollback.upgrade() {
                inner.interrupt();
            }
            settler.resolve(());
        })
    }

    /// Receive lifecycle signals (start, end, interrupt, hover) from now on.
    pub fn observe(&self, observer: impl Fn(Signal) + 'static) {
        self.inner.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Abort any drag or command, rolling back and reporting the committed value.
    pub fn interrupt(&self) {
        self.inner.interrupt();
    }

    #[must_use]
    pub fn machine(&self) -> Ref<'_, GizmoStateMachine> {
        self.inner.machine.borrow()
    }

    #[must_use]
    pub fn state(&self) -> StateTag {
        self.inner.machine.borrow().state()
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.machine.borrow().gizmo().value()
    }

    pub fn set_value(&self, value: Value) {
        self.inner.machine.borrow_mut().gizmo_mut().set_value(value);
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.inner.machine.borrow().gizmo().name().to_string()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.machine.borrow().is_active()
    }

    pub fn set_active(&self, active: bool) {
        self.inner.machine.borrow_mut().set_active(active);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.machine.borrow().is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.machine.borrow_mut().set_enabled(enabled);
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Helper for GizmoHandle {
    fn update(&self, camera: &Camera) {
        self.inner.update(camera);
    }
}

impl Helper for HandleInner {
    fn update(&self, camera: &Camera) {
        if let Ok(mut machine) = self.machine.try_borrow_mut() {
            machine.set_camera(*camera);
        }
    }
}

impl HandleInner {
    /// Register helper, key bindings and persistent listeners for one execution.
    fn attach(self: &Rc<Self>, mode: Mode) -> CompositeDisposable {
        let mut disposables = CompositeDisposable::new();
        let viewport = &self.viewport;
        disposables.add(viewport.add_helper(Rc::clone(self) as Rc<dyn Helper>));
        if mode.contains(Mode::DISABLE_SELECTION) {
            disposables.add(viewport.disable_selection());
        }

        let commands: Vec<(String, CommandAction)> = self.machine.borrow().gizmo().commands().to_vec();
        for (command, action) in commands {
            let weak = Rc::downgrade(self);
            disposables.add(viewport.bind_command(command, move || match weak.upgrade() {
                Some(inner) => inner.run_command(&action),
                None => Ok(()),
            }));
        }

        let weak = Rc::downgrade(self);
        disposables.add(viewport.add_listener(Phase::Capture, move |event| {
            with_inner(&weak, |inner| match event {
                InputEvent::PointerDown(pointer) => inner.on_pointer_down(*pointer),
                InputEvent::KeyPress(key) => {
                    inner.on_key_press(key);
                    Ok(())
                }
                _ => Ok(()),
            })
        }));
        let weak = Rc::downgrade(self);
        disposables.add(viewport.add_listener(Phase::Bubble, move |event| {
            with_inner(&weak, |inner| {
                if let InputEvent::PointerMove(pointer) = event {
                    inner.on_pointer_hover(*pointer);
                }
                Ok(())
            })
        }));
        disposables
    }

    /// Document listeners for one drag or modal session, plus the controls lock.
    fn attach_transient(self: &Rc<Self>) -> Disposable {
        let mut session = CompositeDisposable::new();
        session.add(self.viewport.disable_controls());
        let weak = Rc::downgrade(self);
        session.add(self.viewport.add_listener(Phase::Document, move |event| {
            with_inner(&weak, |inner| match event {
                InputEvent::PointerMove(pointer) => inner.on_pointer_move(*pointer),
                InputEvent::PointerUp(pointer) => inner.on_pointer_up(*pointer),
                _ => Ok(()),
            })
        }));
        Disposable::new(move || session.dispose())
    }

    fn run_command(self: &Rc<Self>, action: &CommandAction) -> Result<(), GizmoError> {
        match action {
            CommandAction::Invoke(f) => {
                if self.machine.borrow().is_enabled() {
                    f();
                }
                Ok(())
            }
            CommandAction::Modal => {
                // No pointer yet means the command arrived before any motion; start at center.
                let pointer = self.viewport.last_pointer().unwrap_or_default();
                let transition = {
                    let mut machine = self.machine.borrow_mut();
                    machine.update(self.viewport.camera(), pointer);
                    machine.command(|| self.attach_transient())?
                };
                self.emit(transition);
                Ok(())
            }
        }
    }

    fn on_pointer_down(self: &Rc<Self>, pointer: PointerEvent) -> Result<(), GizmoError> {
        let transition = {
            let mut machine = self.machine.borrow_mut();
            machine.update(self.viewport.camera(), pointer);
            machine.pointer_down(|| self.attach_transient())?
        };
        self.emit(transition);
        Ok(())
    }

    fn on_pointer_hover(&self, pointer: PointerEvent) {
        let transition = {
            let mut machine = self.machine.borrow_mut();
            machine.update(self.viewport.camera(), pointer);
            machine.pointer_hover()
        };
        self.emit(transition);
    }

    fn on_pointer_move(&self, pointer: PointerEvent) -> Result<(), GizmoError> {
        let transition = {
            let mut machine = self.machine.borrow_mut();
            machine.update(self.viewport.camera(), pointer);
            machine.pointer_move()?
        };
        self.emit(transition);
        Ok(())
    }

    fn on_pointer_up(&self, pointer: PointerEvent) -> Result<(), GizmoError> {
        let transition = {
            let mut machine = self.machine.borrow_mut();
            machine.update(self.viewport.camera(), pointer);
            machine.pointer_up()?
        };
        let ended = transition.has(Signal::End);
        self.emit(transition);
        if ended && !self.mode.get().contains(Mode::PERSISTENT) {
            let settler = self.settler.borrow().clone();
            if let Some(settler) = settler {
                settler.resolve(());
            }
        }
        Ok(())
    }

    fn on_key_press(&self, key: &str) {
        let transition = self.machine.borrow_mut().key_press(key);
        self.emit(transition);
    }

    fn interrupt(&self) {
        let transition = self.machine.borrow_mut().interrupt();
        self.emit(transition);
    }

    /// Deliver signals, then the value, with no machine borrow held.
    fn emit(&self, transition: Transition) {
        if !transition.signals.is_empty() {
            let observers: Vec<Observer> = self.observers.borrow().clone();
            for signal in &transition.signals {
                for observer in &observers {
                    observer(*signal);
                }
            }
        }
        if let Some(value) = transition.value {
            let taken = self.callback.borrow_mut().take();
            if let Some(mut callback) = taken {
                callback(value);
                let mut slot = self.callback.borrow_mut();
                if slot.is_none() {
                    *slot = Some(callback);
                }
            }
        }
    }
}

fn with_inner(
    weak: &Weak<HandleInner>,
    f: impl FnOnce(&Rc<HandleInner>) -> Result<(), GizmoError>,
) -> Result<(), GizmoError> {
    match weak.upgrade() {
        Some(inner) => f(&inner),
        None => Ok(()),
    }
}
