//! Shared numeric constants for the gizmo crate.

// ── Pickers ─────────────────────────────────────────────────────

/// World-space radius of the sphere picker at the tip of an axial gizmo.
pub const PICKER_RADIUS: f32 = 0.2;

/// World-space radius of a circular gizmo's ring.
pub const RING_RADIUS: f32 = 1.0;

/// Half thickness of the ring picker, in world units.
pub const RING_SLOP: f32 = 0.15;

/// Offset of a planar gizmo's knob center along each in-plane axis.
pub const KNOB_OFFSET: f32 = 0.5;

/// Half side length of a planar gizmo's square knob.
pub const KNOB_HALF: f32 = 0.2;

// ── Snapping ────────────────────────────────────────────────────

/// Angular step, in degrees, applied while Ctrl is held on a circular gizmo.
pub const ANGLE_SNAP_DEGREES: f32 = 5.0;

// ── Numerics ────────────────────────────────────────────────────

/// Below this, a ray is treated as parallel to a plane.
pub const PARALLEL_EPSILON: f32 = 1e-6;
