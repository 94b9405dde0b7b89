//! The gizmo: a named, positioned handle with a value strategy.
//!
//! A gizmo knows how to hit-test itself, which keyboard commands start it,
//! and how each interaction hook changes its value. It knows nothing about
//! listeners or lifecycles; [`GizmoStateMachine`](crate::GizmoStateMachine)
//! decides when each hook runs.

#[cfg(test)]
#[path = "gizmo_test.rs"]
mod gizmo_test;

use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::camera::{Camera, Ray};
use crate::error::GizmoError;
use crate::machine::MovementInfo;
use crate::strategy::{InputMode, Strategy, Value};

/// What a bound keyboard command does.
#[derive(Clone)]
pub enum CommandAction {
    /// Start a modal interaction: the pointer drives the value without a
    /// button held, typed digits override it, pointer-up commits.
    Modal,
    /// Run a closure and stay in the current state.
    Invoke(Rc<dyn Fn()>),
}

impl fmt::Debug for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modal => f.write_str("Modal"),
            Self::Invoke(_) => f.write_str("Invoke(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gizmo {
    name: String,
    position: Vec3,
    strategy: Strategy,
    commands: Vec<(String, CommandAction)>,
    input_mode: InputMode,
    visible: bool,
    hovered: bool,
}

impl Gizmo {
    /// A gizmo named like `extrude:distance`, bound to the modal command
    /// `gizmo:extrude:distance`.
    pub fn new(name: impl Into<String>, position: Vec3, strategy: Strategy) -> Self {
        let name = name.into();
        let commands = vec![(format!("gizmo:{name}"), CommandAction::Modal)];
        Self { name, position, strategy, commands, input_mode: InputMode::Pointer, visible: true, hovered: false }
    }

    pub fn axial(name: impl Into<String>, position: Vec3, axis: Vec3) -> Self {
        Self::new(name, position, Strategy::axial(axis))
    }

    pub fn planar(name: impl Into<String>, position: Vec3, normal: Vec3) -> Self {
        Self::new(name, position, Strategy::planar(normal))
    }

    pub fn circular(name: impl Into<String>, position: Vec3) -> Self {
        Self::new(name, position, Strategy::circular())
    }

    /// Lower bound for an axial gizmo's value. Ignored by other strategies.
    #[must_use]
    pub fn with_min(mut self, min: f32) -> Self {
        self.strategy.set_min(min);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.strategy.set_value(value);
        self
    }

    #[must_use]
    pub fn with_command(mut self, name: impl Into<String>, action: CommandAction) -> Self {
        self.commands.push((name.into(), action));
        self
    }

    /// Drop every keyboard binding, including the default one.
    #[must_use]
    pub fn without_commands(mut self) -> Self {
        self.commands.clear();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command family: `extrude` for `extrude:distance`.
    #[must_use]
    pub fn title(&self) -> &str {
        self.name.split(':').next().unwrap_or_default()
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[must_use]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.strategy.value()
    }

    #[must_use]
    pub fn committed(&self) -> Value {
        self.strategy.committed()
    }

    /// Replace the committed value, e.g. to seed a gizmo from a previous run.
    pub fn set_value(&mut self, value: Value) {
        self.strategy.set_value(value);
    }

    #[must_use]
    pub fn commands(&self) -> &[(String, CommandAction)] {
        &self.commands
    }

    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CommandAction> {
        self.commands.iter().find(|(n, _)| n == name).map(|(_, action)| action)
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn hit(&self, camera: &Camera, ray: &Ray) -> bool {
        self.strategy.hit(self.position, camera, ray)
    }

    // --- hooks ---

    pub(crate) fn on_pointer_enter(&mut self) {
        self.hovered = true;
    }

    pub(crate) fn on_pointer_leave(&mut self) {
        self.hovered = false;
    }

    pub(crate) fn on_pointer_down(&mut self, camera: &Camera, ray: &Ray) -> Result<(), GizmoError> {
        self.strategy.begin(self.position, camera, ray)
    }

    pub(crate) fn on_pointer_move(&mut self, camera: &Camera, ray: &Ray, info: &MovementInfo) -> Option<Value> {
        if self.input_mode == InputMode::Keyboard {
            return None;
        }
        self.strategy.drag(self.position, camera, ray, info)
    }

    /// Typed text replaces the pointer value until it stops parsing.
    pub(crate) fn on_key_press(&mut self, text: &str) -> Option<Value> {
        let value = self.strategy.typed(text);
        self.input_mode = if value.is_some() { InputMode::Keyboard } else { InputMode::Pointer };
        value
    }

    pub(crate) fn on_pointer_up(&mut self) {
        self.strategy.commit();
        self.input_mode = InputMode::Pointer;
        self.hovered = false;
    }

    pub(crate) fn on_interrupt(&mut self) -> Value {
        self.input_mode = InputMode::Pointer;
        self.strategy.interrupt()
    }
}
