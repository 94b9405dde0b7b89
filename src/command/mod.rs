//! Commands — modal tools run one at a time by the executor.
//!
//! DESIGN
//! ======
//! A command owns a [`Registrar`]. Everything it starts (gizmo operations,
//! the provisional geometry [`Factory`]) is registered there, so the
//! executor can end the whole command with a single verb:
//!
//! - `finish` after `execute` returns normally commits the factory;
//! - `cancel` after an error discards it;
//! - `interrupt`, sent when another command is enqueued, rolls the gizmos
//!   back to their committed values and commits those.
//!
//! Gizmo operations are registered before the factory so that a cascaded
//! interrupt reports the rolled-back value to the factory before the
//! factory commits.

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod extrude;
pub mod factory;
pub mod transform;

use std::rc::Rc;

use cancel::{OperationError, Registrar, RegistrarError};
use futures::future::LocalBoxFuture;
use gizmo::{GizmoError, Viewport};

use crate::config::CommandKind;

pub use extrude::{ExtrudeCommand, ExtrudeParams};
pub use factory::Factory;
pub use transform::{MoveCommand, MoveParams, RotateCommand, RotateParams};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Registrar(#[from] RegistrarError),
    #[error(transparent)]
    Gizmo(#[from] GizmoError),
}

impl CommandError {
    /// Cancel, finish, interrupt and "already ended" are normal ways for a
    /// command to stop; everything else is a failure worth a warning.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        match self {
            Self::Operation(err) => err.is_lifecycle(),
            Self::Registrar(RegistrarError::AlreadyFinished { .. }) => true,
            Self::Gizmo(_) => false,
        }
    }
}

/// A modal tool.
pub trait Command {
    fn title(&self) -> &'static str;

    fn registrar(&self) -> &Registrar;

    /// Start the command's gizmos and wait until the registrar's operations
    /// have all settled.
    fn execute(self: Rc<Self>) -> LocalBoxFuture<'static, Result<(), CommandError>>;

    /// The committed parameters, `null` when nothing was committed.
    ///
    /// # Errors
    ///
    /// Serialization failures from `serde_json`.
    fn report(&self) -> Result<serde_json::Value, serde_json::Error>;
}

/// Build a fresh command of `kind` bound to `viewport`.
///
/// `persistent` keeps single-drag commands alive after pointer-up.
pub fn build(kind: CommandKind, viewport: &Rc<Viewport>, persistent: bool) -> Rc<dyn Command> {
    match kind {
        CommandKind::Extrude => Rc::new(ExtrudeCommand::new(viewport)),
        CommandKind::Move => Rc::new(MoveCommand::new(viewport, persistent)),
        CommandKind::Rotate => Rc::new(RotateCommand::new(viewport, persistent)),
    }
}
