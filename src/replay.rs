//! Replay — feeds a recorded script through a viewport and executor.
//!
//! DESIGN
//! ======
//! One [`Viewport`] and one [`Executor`] stand in for the host application.
//! Input steps are dispatched to the viewport, camera steps replace the
//! camera, and the remaining steps drive the executor. After every step the
//! executor runs until all commands wait on input again, so a script reads
//! like a sequence of host frames.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use futures::task::SpawnError;
use gizmo::{Camera, GizmoError, Viewport};
use glam::Vec3;

use crate::command;
use crate::config::{CommandKind, ReplayConfig};
use crate::executor::{CommandReport, Executor};
use crate::script::{self, Step};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("step {index} ({step}) failed: {source}")]
    Step {
        index: usize,
        step: &'static str,
        #[source]
        source: GizmoError,
    },

    #[error("failed to spawn command: {0}")]
    Spawn(#[from] SpawnError),
}

/// Read and parse a script file.
///
/// # Errors
///
/// [`ReplayError::Io`] if the file cannot be read, [`ReplayError::Json`] if
/// it is not a valid script.
pub fn load(path: &Path) -> Result<Vec<Step>, ReplayError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    Ok(script::parse(&text)?)
}

pub struct Replay {
    viewport: Rc<Viewport>,
    executor: Executor,
    config: ReplayConfig,
}

impl Replay {
    #[must_use]
    pub fn new(config: ReplayConfig) -> Self {
        Self { viewport: Viewport::new(), executor: Executor::new(), config }
    }

    #[must_use]
    pub fn viewport(&self) -> &Rc<Viewport> {
        &self.viewport
    }

    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Enqueue the configured command and let it wire its gizmos.
    ///
    /// # Errors
    ///
    /// [`ReplayError::Spawn`] if the executor cannot spawn.
    pub fn start(&self) -> Result<(), ReplayError> {
        self.enqueue(self.config.command)
    }

    fn enqueue(&self, kind: CommandKind) -> Result<(), ReplayError> {
        tracing::info!(command = %kind, persistent = self.config.persistent, "enqueue command");
        self.executor.enqueue(command::build(kind, &self.viewport, self.config.persistent))?;
        self.executor.run_until_stalled();
        Ok(())
    }

    /// Apply one step, then run the executor until it waits on input.
    ///
    /// # Errors
    ///
    /// [`ReplayError::Step`] when the viewport rejects an input step.
    pub fn step(&self, index: usize, step: &Step) -> Result<(), ReplayError> {
        tracing::debug!(index, step = step.name(), "replay step");
        if let Some(event) = step.input(&self.viewport.camera()) {
            self.viewport
                .dispatch(event)
                .map_err(|source| ReplayError::Step { index, step: step.name(), source })?;
        } else {
            match step {
                Step::Camera { eye, target } => {
                    let camera = Camera::look_at(Vec3::from_array(*eye), Vec3::from_array(*target), Vec3::Y);
                    self.viewport.set_camera(camera);
                }
                Step::Run { command } => self.enqueue(*command)?,
                Step::Finish => warn_if_idle(step, self.executor.finish_active()),
                Step::Cancel => warn_if_idle(step, self.executor.cancel_active()),
                Step::Interrupt => warn_if_idle(step, self.executor.interrupt_active()),
                Step::PointerDown(_) | Step::PointerMove(_) | Step::PointerUp(_) | Step::Key { .. } | Step::Command { .. } => {}
            }
        }
        self.executor.run_until_stalled();
        Ok(())
    }

    /// Start, apply every step, then finish whatever is still running.
    ///
    /// # Errors
    ///
    /// The first step error; commands still running are finished first.
    pub fn run(&self, steps: &[Step]) -> Result<Vec<CommandReport>, ReplayError> {
        self.start()?;
        for (index, step) in steps.iter().enumerate() {
            if let Err(err) = self.step(index, step) {
                self.executor.shutdown();
                return Err(err);
            }
        }
        self.executor.shutdown();
        let reports = self.executor.take_reports();
        tracing::info!(reports = reports.len(), "replay complete");
        Ok(reports)
    }
}

fn warn_if_idle(step: &Step, had_active: bool) {
    if !had_active {
        tracing::warn!(step = step.name(), "no active command");
    }
}
