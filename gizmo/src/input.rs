//! Input model: buttons, modifier keys, pointer and keyboard events.
//!
//! Positions are normalized device coordinates (x and y in -1..1, y up) so
//! the state machine never needs to know the viewport's pixel size.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use bitflags::bitflags;
use glam::Vec2;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const CTRL: Self = Self { shift: false, ctrl: true, alt: false, meta: false };
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// One pointer sample.
///
/// `button` is the button whose state changed with this event; moves carry
/// `None` unless a button was pressed or released mid-move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub position: Vec2,
    pub button: Option<Button>,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self { position: Vec2::new(x, y), button: None, modifiers: Modifiers::default() }
    }

    /// Same position, with the primary button as the changed button.
    #[must_use]
    pub fn primary(self) -> Self {
        self.with_button(Button::Primary)
    }

    #[must_use]
    pub fn with_button(mut self, button: Button) -> Self {
        self.button = Some(button);
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Everything the host feeds into [`Viewport::dispatch`](crate::Viewport::dispatch).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    /// A printable key or `"Backspace"`.
    KeyPress(String),
    /// A named keyboard command such as `gizmo:move:x`.
    Command(String),
}

impl InputEvent {
    #[must_use]
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::PointerDown(p) | Self::PointerMove(p) | Self::PointerUp(p) => Some(p),
            Self::KeyPress(_) | Self::Command(_) => None,
        }
    }

    /// Short event name for logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PointerDown(_) => "pointer_down",
            Self::PointerMove(_) => "pointer_move",
            Self::PointerUp(_) => "pointer_up",
            Self::KeyPress(_) => "key_press",
            Self::Command(_) => "command",
        }
    }
}

bitflags! {
    /// How a gizmo execution ends and what it locks while running.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mode: u8 {
        /// Keep running after pointer-up; the owner ends it explicitly.
        const PERSISTENT = 1 << 0;
        /// Disable viewport selection for the lifetime of the execution.
        const DISABLE_SELECTION = 1 << 1;
    }
}
