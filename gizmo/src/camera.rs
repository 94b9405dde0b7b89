//! Viewing camera, rays and planes.
//!
//! The camera stores an orthonormal basis (`forward`, `right`, `up`) rather
//! than a matrix; rays and projections are built directly from it.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use glam::{Vec2, Vec3};

use crate::consts::PARALLEL_EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// Width over height.
    pub aspect: f32,
    /// Vertical field of view in radians (perspective only).
    pub fovy: f32,
    pub projection: Projection,
    /// Half of the visible height in world units (orthographic only).
    pub ortho_half_h: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
    }
}

impl Camera {
    /// Perspective camera at `eye` looking at `target`, 45° vertical fov.
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, world_up: Vec3) -> Self {
        let (forward, right, up) = basis(eye, target, world_up);
        Self {
            eye,
            forward,
            right,
            up,
            aspect: 1.0,
            fovy: 45.0_f32.to_radians(),
            projection: Projection::Perspective,
            ortho_half_h: 1.0,
        }
    }

    /// Orthographic camera showing `half_height` world units above and below center.
    #[must_use]
    pub fn orthographic(eye: Vec3, target: Vec3, half_height: f32) -> Self {
        let (forward, right, up) = basis(eye, target, Vec3::Y);
        Self {
            eye,
            forward,
            right,
            up,
            aspect: 1.0,
            fovy: 45.0_f32.to_radians(),
            projection: Projection::Orthographic,
            ortho_half_h: half_height.max(f32::EPSILON),
        }
    }

    #[must_use]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = if aspect > 0.0 { aspect } else { 1.0 };
        self
    }

    fn half_extent(&self, depth: f32) -> (f32, f32) {
        let half_h = match self.projection {
            Projection::Perspective => (0.5 * self.fovy).tan() * depth,
            Projection::Orthographic => self.ortho_half_h,
        };
        (half_h * self.aspect, half_h)
    }

    /// The ray under a point in normalized device coordinates.
    #[must_use]
    pub fn ray(&self, ndc: Vec2) -> Ray {
        match self.projection {
            Projection::Perspective => {
                let (half_w, half_h) = self.half_extent(1.0);
                let direction = (self.forward + self.right * (ndc.x * half_w) + self.up * (ndc.y * half_h))
                    .normalize_or_zero();
                Ray { origin: self.eye, direction }
            }
            Projection::Orthographic => {
                let (half_w, half_h) = self.half_extent(1.0);
                let origin = self.eye + self.right * (ndc.x * half_w) + self.up * (ndc.y * half_h);
                Ray { origin, direction: self.forward }
            }
        }
    }

    /// Project a world point to normalized device coordinates.
    ///
    /// Points behind a perspective camera are clamped to the near side.
    #[must_use]
    pub fn project(&self, world: Vec3) -> Vec2 {
        let rel = world - self.eye;
        let depth = match self.projection {
            Projection::Perspective => rel.dot(self.forward).max(PARALLEL_EPSILON),
            Projection::Orthographic => 1.0,
        };
        let (half_w, half_h) = self.half_extent(depth);
        Vec2::new(rel.dot(self.right) / half_w, rel.dot(self.up) / half_h)
    }

    /// Plane through `point` facing the camera.
    #[must_use]
    pub fn facing_plane(&self, point: Vec3) -> Plane {
        Plane { point, normal: -self.forward }
    }
}

fn basis(eye: Vec3, target: Vec3, world_up: Vec3) -> (Vec3, Vec3, Vec3) {
    let mut forward = (target - eye).normalize_or_zero();
    if forward == Vec3::ZERO {
        forward = Vec3::NEG_Z;
    }
    let mut right = forward.cross(world_up).normalize_or_zero();
    if right == Vec3::ZERO {
        right = forward.any_orthonormal_vector();
    }
    let up = right.cross(forward);
    (forward, right, up)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    #[must_use]
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self { point, normal: normal.normalize_or_zero() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self { origin: Vec3::ZERO, direction: Vec3::NEG_Z }
    }
}

impl Ray {
    /// Where the ray meets `plane`, if in front of the origin and not parallel.
    #[must_use]
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = plane.normal.dot(plane.point - self.origin) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.origin + self.direction * t)
    }

    /// Shortest distance from the ray (not the line) to `point`.
    #[must_use]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let v = point - self.origin;
        let t = v.dot(self.direction).max(0.0);
        (v - self.direction * t).length()
    }
}
