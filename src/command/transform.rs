//! Move and rotate: single-gizmo commands that complete after one drag.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use std::fmt::Debug;
use std::rc::Rc;

use cancel::Registrar;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gizmo::{Gizmo, GizmoHandle, Mode, Value, Viewport};
use glam::Vec3;
use serde::Serialize;

use super::{Command, CommandError, Factory};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveParams {
    pub offset: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotateParams {
    pub radians: f32,
}

fn mode(persistent: bool) -> Mode {
    if persistent { Mode::PERSISTENT | Mode::DISABLE_SELECTION } else { Mode::DISABLE_SELECTION }
}

/// Run one gizmo, feeding every value through `convert` into `factory`.
async fn drive<P>(
    registrar: Registrar,
    handle: GizmoHandle,
    factory: Factory<P>,
    mode: Mode,
    convert: fn(Value) -> Option<P>,
) -> Result<(), CommandError>
where
    P: Clone + Debug + 'static,
{
    if let Some(params) = convert(handle.value()) {
        factory.update(params);
    }
    let sink = factory.clone();
    let op = handle.execute(
        move |value| {
            if let Some(params) = convert(value) {
                sink.update(params);
            }
        },
        mode,
    );
    registrar.register(op)?;
    registrar.register(factory)?;
    registrar.finished()?.await?;
    Ok(())
}

// --- move ---

pub struct MoveCommand {
    registrar: Registrar,
    handle: GizmoHandle,
    factory: Factory<MoveParams>,
    mode: Mode,
}

impl MoveCommand {
    /// Translate in the XY plane with a knob at the origin.
    #[must_use]
    pub fn new(viewport: &Rc<Viewport>, persistent: bool) -> Self {
        let gizmo = Gizmo::planar("move", Vec3::ZERO, Vec3::Z);
        Self {
            registrar: Registrar::new(),
            handle: GizmoHandle::new(gizmo, viewport),
            factory: Factory::new("move"),
            mode: mode(persistent),
        }
    }

    #[must_use]
    pub fn handle(&self) -> &GizmoHandle {
        &self.handle
    }

    #[must_use]
    pub fn factory(&self) -> &Factory<MoveParams> {
        &self.factory
    }
}

impl Command for MoveCommand {
    fn title(&self) -> &'static str {
        "move"
    }

    fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    fn execute(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), CommandError>> {
        drive(self.registrar.clone(), self.handle.clone(), self.factory.clone(), self.mode, |value| {
            value.as_vector().map(|v| MoveParams { offset: v.to_array() })
        })
        .boxed_local()
    }

    fn report(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.factory.committed())
    }
}

// --- rotate ---

pub struct RotateCommand {
    registrar: Registrar,
    handle: GizmoHandle,
    factory: Factory<RotateParams>,
    mode: Mode,
}

impl RotateCommand {
    /// Rotate about the view axis through the origin.
    #[must_use]
    pub fn new(viewport: &Rc<Viewport>, persistent: bool) -> Self {
        let gizmo = Gizmo::circular("rotate", Vec3::ZERO);
        Self {
            registrar: Registrar::new(),
            handle: GizmoHandle::new(gizmo, viewport),
            factory: Factory::new("rotate"),
            mode: mode(persistent),
        }
    }

    #[must_use]
    pub fn handle(&self) -> &GizmoHandle {
        &self.handle
    }

    #[must_use]
    pub fn factory(&self) -> &Factory<RotateParams> {
        &self.factory
    }
}

impl Command for RotateCommand {
    fn title(&self) -> &'static str {
        "rotate"
    }

    fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    fn execute(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), CommandError>> {
        drive(self.registrar.clone(), self.handle.clone(), self.factory.clone(), self.mode, |value| {
            value.as_scalar().map(|radians| RotateParams { radians })
        })
        .boxed_local()
    }

    fn report(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.factory.committed())
    }
}
