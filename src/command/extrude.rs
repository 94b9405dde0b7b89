//! Extrude: push a face along its normal with an optional taper.
//!
//! Two gizmos in one composite: an arrow for the distance and a ring for the
//! taper angle. The composite runs persistently, so the user can alternate
//! between the two until the command is finished or interrupted.

#[cfg(test)]
#[path = "extrude_test.rs"]
mod extrude_test;

use std::rc::Rc;

use cancel::Registrar;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gizmo::{CompositeGizmo, Gizmo, GizmoHandle, Mode, Value, Viewport};
use glam::Vec3;
use serde::Serialize;

use super::{Command, CommandError, Factory};

/// Where the taper ring sits relative to the face center.
const TAPER_OFFSET: Vec3 = Vec3::new(2.0, 0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtrudeParams {
    pub distance: f32,
    /// Taper angle in radians.
    pub taper: f32,
}

impl Default for ExtrudeParams {
    fn default() -> Self {
        Self { distance: 1.0, taper: 0.0 }
    }
}

pub struct ExtrudeCommand {
    registrar: Registrar,
    viewport: Rc<Viewport>,
    composite: CompositeGizmo<ExtrudeParams>,
    factory: Factory<ExtrudeParams>,
}

impl ExtrudeCommand {
    /// Extrude the face at the origin along +Y.
    #[must_use]
    pub fn new(viewport: &Rc<Viewport>) -> Self {
        Self::with_face(viewport, Vec3::ZERO, Vec3::Y, ExtrudeParams::default())
    }

    #[must_use]
    pub fn with_face(viewport: &Rc<Viewport>, center: Vec3, normal: Vec3, params: ExtrudeParams) -> Self {
        let composite = CompositeGizmo::new(params, viewport);
        let distance = Gizmo::axial("extrude:distance", center, normal)
            .with_min(0.0)
            .with_value(Value::Scalar(params.distance));
        let taper = Gizmo::circular("extrude:taper", center + TAPER_OFFSET).with_value(Value::Scalar(params.taper));
        composite.add_gizmo(GizmoHandle::new(distance, viewport), |p, value| {
            if let Some(v) = value.as_scalar() {
                p.distance = v;
            }
        });
        composite.add_gizmo(GizmoHandle::new(taper, viewport), |p, value| {
            if let Some(v) = value.as_scalar() {
                p.taper = v;
            }
        });
        Self { registrar: Registrar::new(), viewport: Rc::clone(viewport), composite, factory: Factory::new("extrude") }
    }

    #[must_use]
    pub fn composite(&self) -> &CompositeGizmo<ExtrudeParams> {
        &self.composite
    }

    #[must_use]
    pub fn factory(&self) -> &Factory<ExtrudeParams> {
        &self.factory
    }
}

impl Command for ExtrudeCommand {
    fn title(&self) -> &'static str {
        "extrude"
    }

    fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    fn execute(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), CommandError>> {
        async move {
            self.factory.update(*self.composite.params());
            let factory = self.factory.clone();
            let op = self.composite.execute(
                move |params| factory.update(*params),
                Mode::PERSISTENT | Mode::DISABLE_SELECTION,
                self.viewport.show_presenter(),
            );
            self.registrar.register(op)?;
            self.registrar.register(self.factory.clone())?;
            self.registrar.finished()?.await?;
            Ok(())
        }
        .boxed_local()
    }

    fn report(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.factory.committed())
    }
}
