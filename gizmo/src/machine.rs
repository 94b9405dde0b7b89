//! Interaction state machine shared by every gizmo.
//!
//! DESIGN
//! ======
//! Four states: `none`, `hover`, `dragging` (button held) and `command`
//! (modal, started from the keyboard, no button held). Transitions are driven
//! by the handle's listeners after [`GizmoStateMachine::update`] has stored
//! the latest camera and pointer. Each transition returns a [`Transition`]
//! describing the value to report and the lifecycle signals to broadcast;
//! the caller delivers both after releasing its borrow on the machine, so
//! observers are free to reach back into sibling gizmos.
//!
//! Two gates: `is_enabled` false ignores everything; `is_active` false
//! ignores the pointer but keyboard commands still start the gizmo.
//!
//! TRADE-OFFS
//! ==========
//! The polar angle is `atan2(end - center) - atan2(start - center)` with no
//! unwrapping, so a drag crossing the negative x axis of the center jumps by
//! a full turn. Circular gizmos accept this; a continuous angle would need
//! per-move accumulation.

#[cfg(test)]
#[path = "machine_test.rs"]
mod machine_test;

use std::fmt;
use std::rc::Rc;

use cancel::Disposable;
use glam::{Vec2, Vec3};

use crate::camera::{Camera, Ray};
use crate::error::GizmoError;
use crate::gizmo::Gizmo;
use crate::input::{Button, Modifiers, PointerEvent};
use crate::strategy::Value;
use crate::viewport::Viewport;

/// Pointer motion measured since the interaction started.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementInfo {
    /// Pointer at pointer-down (or command start), in NDC.
    pub start_2d: Vec2,
    /// Latest pointer, in NDC.
    pub end_2d: Vec2,
    /// `start_2d` projected onto the camera-facing plane through the gizmo.
    pub start_3d: Vec3,
    /// `end_2d` projected onto the same plane.
    pub end_3d: Vec3,
    /// The gizmo origin in NDC.
    pub center_2d: Vec2,
    /// Signed polar angle of end versus start around `center_2d`, radians.
    pub angle: f32,
    pub modifiers: Modifiers,
}

/// Observable state of a [`GizmoStateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTag {
    None,
    Hover,
    Dragging,
    Command,
}

impl StateTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hover => "hover",
            Self::Dragging => "dragging",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle signals broadcast to a handle's observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Enter,
    Leave,
    Start,
    End,
    Interrupt,
}

/// What a transition produced: a value for the callback and signals for observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub value: Option<Value>,
    pub signals: Vec<Signal>,
}

impl Transition {
    fn signal(signal: Signal) -> Self {
        Self { value: None, signals: vec![signal] }
    }

    fn value(value: Option<Value>) -> Self {
        Self { value, signals: Vec::new() }
    }

    #[must_use]
    pub fn has(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.signals.is_empty()
    }
}

/// Listeners and presenter owned by one drag or command session.
#[derive(Debug)]
struct Session {
    clear_event_handlers: Disposable,
    clear_presenter: Disposable,
}

impl Session {
    fn dispose(&mut self) {
        self.clear_event_handlers.dispose();
        self.clear_presenter.dispose();
    }
}

#[derive(Debug)]
enum MachineState {
    None,
    Hover,
    Dragging(Session),
    Command { session: Session, text: String },
}

pub struct GizmoStateMachine {
    gizmo: Gizmo,
    viewport: Rc<Viewport>,
    state: MachineState,
    is_active: bool,
    is_enabled: bool,
    camera: Camera,
    pointer: PointerEvent,
    ray: Ray,
    info: MovementInfo,
}

impl fmt::Debug for GizmoStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GizmoStateMachine")
            .field("gizmo", &self.gizmo.name())
            .field("state", &self.state())
            .field("is_active", &self.is_active)
            .field("is_enabled", &self.is_enabled)
            .finish_non_exhaustive()
    }
}

impl GizmoStateMachine {
    #[must_use]
    pub fn new(gizmo: Gizmo, viewport: Rc<Viewport>) -> Self {
        let camera = viewport.camera();
        Self {
            gizmo,
            viewport,
            state: MachineState::None,
            is_active: true,
            is_enabled: true,
            camera,
            pointer: PointerEvent::default(),
            ray: camera.ray(Vec2::ZERO),
            info: MovementInfo::default(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn gizmo(&self) -> &Gizmo {
        &self.gizmo
    }

    pub fn gizmo_mut(&mut self) -> &mut Gizmo {
        &mut self.gizmo
    }

    #[must_use]
    pub fn state(&self) -> StateTag {
        match self.state {
            MachineState::None => StateTag::None,
            MachineState::Hover => StateTag::Hover,
            MachineState::Dragging(_) => StateTag::Dragging,
            MachineState::Command { .. } => StateTag::Command,
        }
    }

    #[must_use]
    pub fn info(&self) -> &MovementInfo {
        &self.info
    }

    /// Text typed during a modal command.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.state {
            MachineState::Command { text, .. } => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Activation also controls visibility; a disabled gizmo stays hidden.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.gizmo.set_visible(active && self.is_enabled);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.is_enabled = enabled;
    }

    // --- Inputs ---

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.ray = camera.ray(self.pointer.position);
    }

    /// Store the latest camera and pointer sample before a transition.
    pub fn update(&mut self, camera: Camera, pointer: PointerEvent) {
        self.camera = camera;
        self.pointer = pointer;
        self.ray = camera.ray(pointer.position);
        self.info.modifiers = pointer.modifiers;
    }

    fn live(&self) -> bool {
        self.is_active && self.is_enabled
    }

    fn invalid(&self, event: &'static str) -> GizmoError {
        GizmoError::InvalidTransition { event, state: self.state() }
    }

    /// Snapshot start positions and let the gizmo capture its drag context.
    fn begin(&mut self) -> Result<(), GizmoError> {
        let origin = self.gizmo.position();
        let point = self
            .ray
            .intersect_plane(&self.camera.facing_plane(origin))
            .ok_or(GizmoError::CorruptIntersection)?;
        self.info.center_2d = self.camera.project(origin);
        self.info.start_2d = self.pointer.position;
        self.info.end_2d = self.pointer.position;
        self.info.start_3d = point;
        self.info.end_3d = point;
        self.info.angle = 0.0;
        self.gizmo.on_pointer_down(&self.camera, &self.ray)
    }

    // --- Transitions ---

    pub fn pointer_hover(&mut self) -> Transition {
        if !self.live() {
            return Transition::default();
        }
        match self.state {
            MachineState::None if self.gizmo.hit(&self.camera, &self.ray) => {
                self.gizmo.on_pointer_enter();
                self.state = MachineState::Hover;
                Transition::signal(Signal::Enter)
            }
            MachineState::Hover if !self.gizmo.hit(&self.camera, &self.ray) => {
                self.gizmo.on_pointer_leave();
                self.state = MachineState::None;
                Transition::signal(Signal::Leave)
            }
            _ => Transition::default(),
        }
    }

    /// Start a drag from `hover` with the primary button.
    ///
    /// `start` attaches the transient move/up listeners and returns their cleanup.
    ///
    /// # Errors
    ///
    /// [`GizmoError::CorruptIntersection`] when the pointer ray misses the
    /// camera-facing plane through the gizmo.
    pub fn pointer_down(&mut self, start: impl FnOnce() -> Disposable) -> Result<Transition, GizmoError> {
        if !self.live() {
            return Ok(Transition::default());
        }
        if !matches!(self.state, MachineState::Hover) || self.pointer.button != Some(Button::Primary) {
            return Ok(Transition::default());
        }
        self.begin()?;
        let clear_event_handlers = start();
        let clear_presenter = self.viewport.show_presenter();
        self.state = MachineState::Dragging(Session { clear_event_handlers, clear_presenter });
        tracing::debug!(gizmo = self.gizmo.name(), "drag started");
        Ok(Transition::signal(Signal::Start))
    }

    /// Start a modal interaction from a keyboard command.
    ///
    /// Only `is_enabled` gates this; an inactive gizmo can be started from
    /// the keyboard.
    ///
    /// # Errors
    ///
    /// [`GizmoError::CorruptIntersection`] as for [`pointer_down`](Self::pointer_down);
    /// the listeners attached by `start` are removed again.
    pub fn command(&mut self, start: impl FnOnce() -> Disposable) -> Result<Transition, GizmoError> {
        if !self.is_enabled || !matches!(self.state, MachineState::None | MachineState::Hover) {
            return Ok(Transition::default());
        }
        let mut clear_event_handlers = start();
        if let Err(err) = self.begin() {
            clear_event_handlers.dispose();
            return Err(err);
        }
        let clear_presenter = self.viewport.show_presenter();
        self.state = MachineState::Command {
            session: Session { clear_event_handlers, clear_presenter },
            text: String::new(),
        };
        tracing::debug!(gizmo = self.gizmo.name(), "modal command started");
        Ok(Transition::signal(Signal::Start))
    }

    /// # Errors
    ///
    /// [`GizmoError::InvalidTransition`] from `none` or `hover`;
    /// [`GizmoError::CorruptIntersection`] when the ray misses the camera plane.
    pub fn pointer_move(&mut self) -> Result<Transition, GizmoError> {
        if !self.live() {
            return Ok(Transition::default());
        }
        match self.state {
            // A button changed mid-drag; not a plain move.
            MachineState::Dragging(_) if self.pointer.button.is_some() => return Ok(Transition::default()),
            MachineState::Dragging(_) | MachineState::Command { .. } => {}
            MachineState::None | MachineState::Hover => return Err(self.invalid("pointer_move")),
        }

        let origin = self.gizmo.position();
        let point = self
            .ray
            .intersect_plane(&self.camera.facing_plane(origin))
            .ok_or(GizmoError::CorruptIntersection)?;
        self.info.end_2d = self.pointer.position;
        self.info.end_3d = point;
        self.info.angle = signed_angle(self.info.center_2d, self.info.start_2d, self.info.end_2d);

        let value = self.gizmo.on_pointer_move(&self.camera, &self.ray, &self.info);
        Ok(Transition::value(value))
    }

    /// Append a key to the modal text buffer; `"Backspace"` removes one character.
    pub fn key_press(&mut self, key: &str) -> Transition {
        if !self.live() {
            return Transition::default();
        }
        let MachineState::Command { text, .. } = &mut self.state else {
            return Transition::default();
        };
        if key == "Backspace" {
            text.pop();
        } else if key.chars().count() == 1 {
            text.push_str(key);
        } else {
            return Transition::default();
        }
        let text = text.clone();
        Transition::value(self.gizmo.on_key_press(&text))
    }

    /// Commit on primary-button release.
    ///
    /// # Errors
    ///
    /// [`GizmoError::InvalidTransition`] from `none` or `hover`.
    pub fn pointer_up(&mut self) -> Result<Transition, GizmoError> {
        if !self.live() {
            return Ok(Transition::default());
        }
        if matches!(self.state, MachineState::None | MachineState::Hover) {
            return Err(self.invalid("pointer_up"));
        }
        if self.pointer.button != Some(Button::Primary) {
            return Ok(Transition::default());
        }
        if let MachineState::Dragging(mut session) | MachineState::Command { mut session, .. } =
            std::mem::replace(&mut self.state, MachineState::None)
        {
            session.dispose();
        }
        self.gizmo.on_pointer_up();
        tracing::debug!(gizmo = self.gizmo.name(), value = ?self.gizmo.value(), "interaction committed");
        Ok(Transition::signal(Signal::End))
    }

    /// Abort the current interaction, rolling the value back.
    pub fn interrupt(&mut self) -> Transition {
        match std::mem::replace(&mut self.state, MachineState::None) {
            MachineState::Dragging(mut session) | MachineState::Command { mut session, .. } => {
                session.dispose();
                let value = self.gizmo.on_interrupt();
                self.gizmo.on_pointer_leave();
                tracing::debug!(gizmo = self.gizmo.name(), "interaction interrupted");
                Transition { value: Some(value), signals: vec![Signal::Interrupt, Signal::Leave] }
            }
            MachineState::Hover => {
                self.gizmo.on_pointer_leave();
                Transition::signal(Signal::Leave)
            }
            MachineState::None => Transition::default(),
        }
    }

    /// Remove session listeners and presenter without changing state or value.
    pub fn finish(&mut self) {
        if let MachineState::Dragging(session) | MachineState::Command { session, .. } = &mut self.state {
            session.dispose();
        }
    }

    /// Drop any interaction and return to `none`, keeping the value.
    ///
    /// Used when the owning execution ends, so the next execution starts
    /// from a clean machine.
    pub fn reset(&mut self) {
        match std::mem::replace(&mut self.state, MachineState::None) {
            MachineState::Dragging(mut session) | MachineState::Command { mut session, .. } => {
                session.dispose();
                self.gizmo.on_pointer_leave();
            }
            MachineState::Hover => self.gizmo.on_pointer_leave(),
            MachineState::None => {}
        }
    }
}

/// Polar angle of `end` minus that of `start`, both around `center`.
#[must_use]
pub fn signed_angle(center: Vec2, start: Vec2, end: Vec2) -> f32 {
    let from = start - center;
    let to = end - center;
    to.y.atan2(to.x) - from.y.atan2(from.x)
}
