//! Pointer and keyboard interaction handles for the 3D viewport.
//!
//! A gizmo is a small on-screen handle (arrow, ring, square knob) that turns
//! a drag or a typed number into a value for the running command. This crate
//! owns the interaction state machine, the three value strategies, the
//! composite that coordinates several gizmos, and the [`viewport::Viewport`]
//! that routes input events to all of them.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`machine`] | Hover / drag / modal-command state machine and [`machine::MovementInfo`] |
//! | [`handle`] | Executes a gizmo as a cancellable [`cancel::Operation`] |
//! | [`composite`] | Several gizmos editing one parameter struct |
//! | [`gizmo`] | The gizmo type, its keyboard commands and hooks |
//! | [`strategy`] | Axial, planar and circular value computation |
//! | [`value`] | Committed / provisional value with rollback |
//! | [`viewport`] | Camera, listener phases, key bindings, helpers |
//! | [`camera`] | Rays and projections |
//! | [`input`] | Pointer and keyboard event types, execution [`input::Mode`] |
//! | [`consts`] | Picker sizes and snapping steps |

pub mod camera;
pub mod composite;
pub mod consts;
pub mod error;
pub mod gizmo;
pub mod handle;
pub mod input;
pub mod machine;
pub mod strategy;
pub mod value;
pub mod viewport;

pub use camera::{Camera, Plane, Ray};
pub use composite::CompositeGizmo;
pub use error::GizmoError;
pub use gizmo::{CommandAction, Gizmo};
pub use handle::GizmoHandle;
pub use input::{Button, InputEvent, Mode, Modifiers, PointerEvent};
pub use machine::{GizmoStateMachine, MovementInfo, Signal, StateTag, Transition};
pub use strategy::{InputMode, Strategy, Value};
pub use value::ValueState;
pub use viewport::{Helper, Phase, Viewport};
