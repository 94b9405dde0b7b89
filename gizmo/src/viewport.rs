//! Input router for one 3D view.
//!
//! DESIGN
//! ======
//! The viewport is the explicit context every gizmo is constructed with: it
//! holds the camera, the listener table, keyboard command bindings and the
//! helpers that follow the camera. Listeners run in three phases per event:
//! `Capture` (gizmo pointer-down and key handlers, ahead of view controls),
//! `Bubble` (hover) and `Document` (transient move/up listeners of a
//! running drag). Each registration returns a [`Disposable`] that removes it.
//!
//! `dispatch` iterates a snapshot, so listeners may add or remove listeners
//! while an event is in flight; removed ones are skipped, added ones see the
//! next event.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use cancel::Disposable;

use crate::camera::Camera;
use crate::error::GizmoError;
use crate::input::{InputEvent, PointerEvent};

/// Something that follows the camera, such as a gizmo that faces the viewer.
pub trait Helper {
    fn update(&self, camera: &Camera);
}

/// Listener phase; lower phases run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Capture,
    Bubble,
    Document,
}

type Callback = dyn Fn(&InputEvent) -> Result<(), GizmoError>;
type Handler = dyn Fn() -> Result<(), GizmoError>;

struct ListenerEntry {
    id: u64,
    phase: Phase,
    alive: Cell<bool>,
    callback: Box<Callback>,
}

struct Binding {
    id: u64,
    name: String,
    alive: Cell<bool>,
    handler: Box<Handler>,
}

pub struct Viewport {
    camera: Cell<Camera>,
    listeners: RefCell<Vec<Rc<ListenerEntry>>>,
    bindings: RefCell<Vec<Rc<Binding>>>,
    helpers: RefCell<Vec<(u64, Rc<dyn Helper>)>>,
    last_pointer: Cell<Option<PointerEvent>>,
    controls_disabled: Cell<u32>,
    selection_disabled: Cell<u32>,
    presenters: Cell<u32>,
    next_id: Cell<u64>,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("camera", &self.camera.get())
            .field("listeners", &self.listener_count())
            .field("bindings", &self.bindings.borrow().len())
            .field("helpers", &self.helpers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Viewport {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Self::with_camera(Camera::default())
    }

    #[must_use]
    pub fn with_camera(camera: Camera) -> Rc<Self> {
        Rc::new(Self {
            camera: Cell::new(camera),
            listeners: RefCell::new(Vec::new()),
            bindings: RefCell::new(Vec::new()),
            helpers: RefCell::new(Vec::new()),
            last_pointer: Cell::new(None),
            controls_disabled: Cell::new(0),
            selection_disabled: Cell::new(0),
            presenters: Cell::new(0),
            next_id: Cell::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    // --- Camera and helpers ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera.get()
    }

    /// Replace the camera and bring every helper up to date.
    pub fn set_camera(&self, camera: Camera) {
        self.camera.set(camera);
        let helpers: Vec<Rc<dyn Helper>> = self.helpers.borrow().iter().map(|(_, h)| Rc::clone(h)).collect();
        for helper in helpers {
            helper.update(&camera);
        }
    }

    /// Keep `helper` in sync with the camera until the returned disposable runs.
    pub fn add_helper(self: &Rc<Self>, helper: Rc<dyn Helper>) -> Disposable {
        let id = self.next_id();
        helper.update(&self.camera());
        self.helpers.borrow_mut().push((id, helper));
        let weak = Rc::downgrade(self);
        Disposable::new(move || {
            if let Some(viewport) = weak.upgrade() {
                viewport.helpers.borrow_mut().retain(|(h, _)| *h != id);
            }
        })
    }

    #[must_use]
    pub fn helper_count(&self) -> usize {
        self.helpers.borrow().len()
    }

    // --- Listeners ---

    pub fn add_listener(
        self: &Rc<Self>,
        phase: Phase,
        callback: impl Fn(&InputEvent) -> Result<(), GizmoError> + 'static,
    ) -> Disposable {
        let entry = Rc::new(ListenerEntry { id: self.next_id(), phase, alive: Cell::new(true), callback: Box::new(callback) });
        self.listeners.borrow_mut().push(Rc::clone(&entry));
        let weak = Rc::downgrade(self);
        Disposable::new(move || {
            entry.alive.set(false);
            if let Some(viewport) = weak.upgrade() {
                viewport.listeners.borrow_mut().retain(|e| e.id != entry.id);
            }
        })
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    #[must_use]
    pub fn listener_count_in(&self, phase: Phase) -> usize {
        self.listeners.borrow().iter().filter(|e| e.phase == phase).count()
    }

    /// Bind a named keyboard command such as `gizmo:move:x`.
    pub fn bind_command(
        self: &Rc<Self>,
        name: impl Into<String>,
        handler: impl Fn() -> Result<(), GizmoError> + 'static,
    ) -> Disposable {
        let binding =
            Rc::new(Binding { id: self.next_id(), name: name.into(), alive: Cell::new(true), handler: Box::new(handler) });
        tracing::trace!(command = %binding.name, "command bound");
        self.bindings.borrow_mut().push(Rc::clone(&binding));
        let weak = Rc::downgrade(self);
        Disposable::new(move || {
            binding.alive.set(false);
            if let Some(viewport) = weak.upgrade() {
                viewport.bindings.borrow_mut().retain(|b| b.id != binding.id);
            }
        })
    }

    /// Names of the currently bound commands, in binding order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.bindings.borrow().iter().map(|b| b.name.clone()).collect()
    }

    /// Route one event to every live listener, phase by phase.
    ///
    /// # Errors
    ///
    /// The first error a listener returns; later listeners do not run.
    /// [`GizmoError::UnknownCommand`] for a command nobody has bound.
    pub fn dispatch(&self, event: InputEvent) -> Result<(), GizmoError> {
        if let Some(pointer) = event.pointer() {
            self.last_pointer.set(Some(*pointer));
        }
        tracing::trace!(event = event.kind(), "dispatch");

        if let InputEvent::Command(name) = &event {
            return self.run_command(name);
        }

        let mut snapshot: Vec<Rc<ListenerEntry>> = self.listeners.borrow().clone();
        snapshot.sort_by_key(|e| e.phase);
        for entry in snapshot {
            if entry.alive.get() {
                (entry.callback)(&event)?;
            }
        }
        Ok(())
    }

    fn run_command(&self, name: &str) -> Result<(), GizmoError> {
        let matching: Vec<Rc<Binding>> = self.bindings.borrow().iter().filter(|b| b.name == name).cloned().collect();
        if matching.is_empty() {
            return Err(GizmoError::UnknownCommand(name.to_string()));
        }
        for binding in matching {
            if binding.alive.get() {
                (binding.handler)()?;
            }
        }
        Ok(())
    }

    /// The most recent pointer event, used as the start of keyboard commands.
    #[must_use]
    pub fn last_pointer(&self) -> Option<PointerEvent> {
        self.last_pointer.get()
    }

    // --- Locks and presenters ---

    fn hold(self: &Rc<Self>, counter: fn(&Self) -> &Cell<u32>) -> Disposable {
        let cell = counter(self);
        cell.set(cell.get() + 1);
        let weak = Rc::downgrade(self);
        Disposable::new(move || {
            if let Some(viewport) = weak.upgrade() {
                let cell = counter(&viewport);
                cell.set(cell.get().saturating_sub(1));
            }
        })
    }

    /// Suspend camera controls while a gizmo drags.
    pub fn disable_controls(self: &Rc<Self>) -> Disposable {
        self.hold(|v| &v.controls_disabled)
    }

    #[must_use]
    pub fn controls_enabled(&self) -> bool {
        self.controls_disabled.get() == 0
    }

    pub fn disable_selection(self: &Rc<Self>) -> Disposable {
        self.hold(|v| &v.selection_disabled)
    }

    #[must_use]
    pub fn selection_enabled(&self) -> bool {
        self.selection_disabled.get() == 0
    }

    /// Show the snap presenter for an interaction.
    pub fn show_presenter(self: &Rc<Self>) -> Disposable {
        self.hold(|v| &v.presenters)
    }

    #[must_use]
    pub fn presenter_count(&self) -> u32 {
        self.presenters.get()
    }
}
