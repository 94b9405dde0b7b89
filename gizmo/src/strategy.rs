//! How a gizmo turns pointer motion and typed text into a value.
//!
//! DESIGN
//! ======
//! One closed enum instead of a gizmo class per shape. Each variant owns its
//! [`ValueState`] plus the drag context captured at pointer-down:
//!
//! - `Axial`: scalar length along `axis`, dragged in the plane that contains
//!   the axis and faces the eye as much as possible. The sign is fixed at
//!   pointer-down so grabbing the handle from either side moves it with the
//!   pointer. Clamped to `min` when read.
//! - `Planar`: vector displacement inside the plane with `normal`.
//! - `Circular`: angle in radians from the screen-space polar angle around
//!   the gizmo center; Ctrl snaps, typed numbers are degrees.

#[cfg(test)]
#[path = "strategy_test.rs"]
mod strategy_test;

use glam::Vec3;

use crate::camera::{Camera, Plane, Projection, Ray};
use crate::consts::{ANGLE_SNAP_DEGREES, KNOB_HALF, KNOB_OFFSET, PICKER_RADIUS, RING_RADIUS, RING_SLOP};
use crate::error::GizmoError;
use crate::machine::MovementInfo;
use crate::value::ValueState;

/// A value emitted by a gizmo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Scalar(f32),
    Vector(Vec3),
}

impl Value {
    #[must_use]
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Vector(_) => None,
        }
    }

    #[must_use]
    pub fn as_vector(self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }
}

/// Whether the last value came from the pointer or from typed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Pointer,
    Keyboard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Axial { axis: Vec3, min: f32, state: ValueState<f32>, sign: f32, start: Vec3 },
    Planar { normal: Vec3, state: ValueState<Vec3>, start: Vec3 },
    Circular { state: ValueState<f32> },
}

impl Strategy {
    #[must_use]
    pub fn axial(axis: Vec3) -> Self {
        Self::Axial {
            axis: axis.normalize_or_zero(),
            min: f32::NEG_INFINITY,
            state: ValueState::new(0.0),
            sign: 1.0,
            start: Vec3::ZERO,
        }
    }

    #[must_use]
    pub fn planar(normal: Vec3) -> Self {
        Self::Planar { normal: normal.normalize_or_zero(), state: ValueState::new(Vec3::ZERO), start: Vec3::ZERO }
    }

    #[must_use]
    pub fn circular() -> Self {
        Self::Circular { state: ValueState::new(0.0) }
    }

    /// The provisional value, clamped where the strategy has a minimum.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Self::Axial { min, state, .. } => Value::Scalar(state.current().max(*min)),
            Self::Planar { state, .. } => Value::Vector(state.current()),
            Self::Circular { state } => Value::Scalar(state.current()),
        }
    }

    /// The last committed value.
    #[must_use]
    pub fn committed(&self) -> Value {
        match self {
            Self::Axial { min, state, .. } => Value::Scalar(state.original().max(*min)),
            Self::Planar { state, .. } => Value::Vector(state.original()),
            Self::Circular { state } => Value::Scalar(state.original()),
        }
    }

    /// Replace the committed value. A value of the wrong kind is ignored.
    pub fn set_value(&mut self, value: Value) {
        match (self, value) {
            (Self::Axial { state, .. } | Self::Circular { state }, Value::Scalar(v)) => state.set_original(v),
            (Self::Planar { state, .. }, Value::Vector(v)) => state.set_original(v),
            (strategy, value) => {
                tracing::warn!(?value, kind = strategy.kind(), "value kind does not match gizmo");
            }
        }
    }

    pub(crate) fn set_min(&mut self, value: f32) {
        if let Self::Axial { min, .. } = self {
            *min = value;
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Axial { .. } => "axial",
            Self::Planar { .. } => "planar",
            Self::Circular { .. } => "circular",
        }
    }

    /// Whether `ray` hits this strategy's picker for a gizmo at `origin`.
    pub(crate) fn hit(&self, origin: Vec3, camera: &Camera, ray: &Ray) -> bool {
        match self {
            Self::Axial { axis, min, state, .. } => {
                let tip = origin + *axis * state.current().max(*min);
                ray.distance_to_point(tip) <= PICKER_RADIUS
            }
            Self::Planar { normal, .. } => {
                let Some(point) = ray.intersect_plane(&Plane::new(origin, *normal)) else {
                    return false;
                };
                let (u, v) = normal.any_orthonormal_pair();
                let local = point - origin;
                (local.dot(u) - KNOB_OFFSET).abs() <= KNOB_HALF && (local.dot(v) - KNOB_OFFSET).abs() <= KNOB_HALF
            }
            Self::Circular { .. } => {
                let Some(point) = ray.intersect_plane(&camera.facing_plane(origin)) else {
                    return false;
                };
                ((point - origin).length() - RING_RADIUS).abs() <= RING_SLOP
            }
        }
    }

    /// Capture drag context at pointer-down or at the start of a modal command.
    pub(crate) fn begin(&mut self, origin: Vec3, camera: &Camera, ray: &Ray) -> Result<(), GizmoError> {
        match self {
            Self::Axial { axis, sign, start, .. } => {
                if let Some(point) = ray.intersect_plane(&axial_plane(origin, *axis, camera)) {
                    *start = point;
                    *sign = if (point - origin).dot(*axis) < 0.0 { -1.0 } else { 1.0 };
                }
                Ok(())
            }
            Self::Planar { normal, start, .. } => {
                *start = ray.intersect_plane(&Plane::new(origin, *normal)).ok_or(GizmoError::CorruptIntersection)?;
                Ok(())
            }
            Self::Circular { .. } => Ok(()),
        }
    }

    /// Recompute the provisional value from the current pointer.
    ///
    /// `None` when the pointer ray misses the drag plane.
    pub(crate) fn drag(&mut self, origin: Vec3, camera: &Camera, ray: &Ray, info: &MovementInfo) -> Option<Value> {
        match self {
            Self::Axial { axis, state, sign, start, .. } => {
                let point = ray.intersect_plane(&axial_plane(origin, *axis, camera))?;
                let dist = (point - *start).dot(*axis);
                state.set_current(state.original() + *sign * dist);
            }
            Self::Planar { normal, state, start } => {
                let point = ray.intersect_plane(&Plane::new(origin, *normal))?;
                state.set_current(state.original() + (point - *start));
            }
            Self::Circular { state } => {
                let angle = state.original() + info.angle;
                state.set_current(if info.modifiers.ctrl { snap_angle(angle) } else { angle });
            }
        }
        Some(self.value())
    }

    /// Apply typed text. `None` when the text is not a number this strategy accepts.
    pub(crate) fn typed(&mut self, text: &str) -> Option<Value> {
        let number = parse_number(text)?;
        match self {
            Self::Axial { state, .. } => state.set_current(number),
            Self::Circular { state } => state.set_current(number.to_radians()),
            Self::Planar { .. } => return None,
        }
        Some(self.value())
    }

    pub(crate) fn commit(&mut self) {
        match self {
            Self::Axial { state, .. } | Self::Circular { state } => state.push(),
            Self::Planar { state, .. } => state.push(),
        }
    }

    /// Roll back and report the value that stands afterwards.
    pub(crate) fn interrupt(&mut self) -> Value {
        match self {
            Self::Axial { state, .. } | Self::Circular { state } => state.interrupt(),
            Self::Planar { state, .. } => state.interrupt(),
        }
        self.value()
    }
}

/// Plane containing `axis` that faces the viewer as much as it can.
fn axial_plane(origin: Vec3, axis: Vec3, camera: &Camera) -> Plane {
    let eye = match camera.projection {
        Projection::Perspective => (camera.eye - origin).normalize_or_zero(),
        Projection::Orthographic => -camera.forward,
    };
    let normal = eye - axis * eye.dot(axis);
    if normal.length_squared() < 1e-8 {
        return camera.facing_plane(origin);
    }
    Plane::new(origin, normal)
}

fn snap_angle(angle: f32) -> f32 {
    ((angle.to_degrees() / ANGLE_SNAP_DEGREES).trunc() * ANGLE_SNAP_DEGREES).to_radians()
}

fn parse_number(text: &str) -> Option<f32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f32>() {
        Ok(number) if number.is_finite() => Some(number),
        _ => None,
    }
}
