//! Replay scripts: a JSON array of viewport steps.
//!
//! ```json
//! [
//!   { "step": "pointer_move", "at": [0, 1, 0] },
//!   { "step": "pointer_down", "at": [0, 1, 0] },
//!   { "step": "pointer_move", "at": [0, 2, 0] },
//!   { "step": "pointer_up", "at": [0, 2, 0] },
//!   { "step": "finish" }
//! ]
//! ```
//!
//! Pointer positions are either NDC (`x`, `y`) or a world point (`at`)
//! projected through the camera current at that step.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use gizmo::{Button, Camera, InputEvent, Modifiers, PointerEvent};
use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::config::CommandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonName {
    Primary,
    Middle,
    Secondary,
}

impl From<ButtonName> for Button {
    fn from(name: ButtonName) -> Self {
        match name {
            ButtonName::Primary => Button::Primary,
            ButtonName::Middle => Button::Middle,
            ButtonName::Secondary => Button::Secondary,
        }
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PointerStep {
    pub x: f32,
    pub y: f32,
    pub at: Option<[f32; 3]>,
    pub button: Option<ButtonName>,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl PointerStep {
    /// The pointer event under `camera`; `fallback` applies when no button is named.
    #[must_use]
    pub fn event(&self, camera: &Camera, fallback: Option<Button>) -> PointerEvent {
        let position = match self.at {
            Some(world) => camera.project(Vec3::from_array(world)),
            None => Vec2::new(self.x, self.y),
        };
        PointerEvent {
            position,
            button: self.button.map(Button::from).or(fallback),
            modifiers: Modifiers { shift: self.shift, ctrl: self.ctrl, alt: self.alt, meta: self.meta },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    PointerDown(PointerStep),
    PointerMove(PointerStep),
    PointerUp(PointerStep),
    Key {
        key: String,
    },
    Command {
        name: String,
    },
    Camera {
        eye: [f32; 3],
        #[serde(default)]
        target: [f32; 3],
    },
    /// Enqueue another command, interrupting the active one.
    Run {
        command: CommandKind,
    },
    Finish,
    Cancel,
    Interrupt,
}

impl Step {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PointerDown(_) => "pointer_down",
            Self::PointerMove(_) => "pointer_move",
            Self::PointerUp(_) => "pointer_up",
            Self::Key { .. } => "key",
            Self::Command { .. } => "command",
            Self::Camera { .. } => "camera",
            Self::Run { .. } => "run",
            Self::Finish => "finish",
            Self::Cancel => "cancel",
            Self::Interrupt => "interrupt",
        }
    }

    /// The viewport event for input steps; `None` for camera and executor steps.
    #[must_use]
    pub fn input(&self, camera: &Camera) -> Option<InputEvent> {
        match self {
            Self::PointerDown(p) => Some(InputEvent::PointerDown(p.event(camera, Some(Button::Primary)))),
            Self::PointerMove(p) => Some(InputEvent::PointerMove(p.event(camera, None))),
            Self::PointerUp(p) => Some(InputEvent::PointerUp(p.event(camera, Some(Button::Primary)))),
            Self::Key { key } => Some(InputEvent::KeyPress(key.clone())),
            Self::Command { name } => Some(InputEvent::Command(name.clone())),
            Self::Camera { .. } | Self::Run { .. } | Self::Finish | Self::Cancel | Self::Interrupt => None,
        }
    }
}

/// Parse a script.
///
/// # Errors
///
/// Any `serde_json` error, including unknown step names.
pub fn parse(text: &str) -> Result<Vec<Step>, serde_json::Error> {
    serde_json::from_str(text)
}
