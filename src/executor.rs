//! Executor — runs commands one at a time on a local pool.
//!
//! DESIGN
//! ======
//! `enqueue` stores the command as the next one to run and interrupts the
//! active command, so a new tool always takes over from the old one with the
//! old one's committed values. A single drain loop, spawned when the executor
//! is idle, runs the queued commands in turn:
//!
//! 1. `execute().await`;
//! 2. `registrar.finish()` on success, `registrar.cancel()` on error;
//! 3. record a [`CommandReport`].
//!
//! Lifecycle errors (cancel, interrupt, already ended) are expected endings
//! and logged at debug; anything else is a warning.
//!
//! TRADE-OFFS
//! ==========
//! Only one command is ever queued. Enqueueing twice before the first one
//! starts replaces it; the replaced command is cancelled without a report.

#[cfg(test)]
#[path = "executor_test.rs"]
mod executor_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::{LocalSpawnExt, SpawnError};
use serde::Serialize;
use uuid::Uuid;

use crate::command::Command;

/// How a command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Interrupted,
    Cancelled,
    Failed,
}

/// One finished command run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReport {
    pub id: Uuid,
    pub title: &'static str,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Registrar state after the executor ended it.
    pub state: String,
    /// Committed parameters, `null` when discarded.
    pub params: serde_json::Value,
}

struct ExecutorInner {
    spawner: LocalSpawner,
    next: RefCell<Option<Rc<dyn Command>>>,
    active: RefCell<Option<Rc<dyn Command>>>,
    preempted: Cell<bool>,
    running: Cell<bool>,
    reports: RefCell<Vec<CommandReport>>,
}

pub struct Executor {
    pool: RefCell<LocalPool>,
    inner: Rc<ExecutorInner>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    #[must_use]
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            inner: Rc::new(ExecutorInner {
                spawner,
                next: RefCell::new(None),
                active: RefCell::new(None),
                preempted: Cell::new(false),
                running: Cell::new(false),
                reports: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Queue `command` and interrupt whatever is running.
    ///
    /// Nothing runs until [`run_until_stalled`](Self::run_until_stalled).
    ///
    /// # Errors
    ///
    /// [`SpawnError`] if the pool refuses the drain loop.
    pub fn enqueue(&self, command: Rc<dyn Command>) -> Result<(), SpawnError> {
        tracing::debug!(title = command.title(), "command enqueued");
        let replaced = self.inner.next.borrow_mut().replace(command);
        if let Some(replaced) = replaced {
            tracing::debug!(title = replaced.title(), "queued command replaced before it started");
            replaced.registrar().cancel();
        }

        let active = self.inner.active.borrow().clone();
        if let Some(active) = active {
            self.inner.preempted.set(true);
            active.registrar().interrupt();
        }

        if !self.inner.running.get() {
            self.inner.running.set(true);
            if let Err(err) = self.inner.spawner.spawn_local(drain(Rc::clone(&self.inner))) {
                self.inner.running.set(false);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Drive queued and active commands until every one is waiting on input.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Finish the active command. Returns whether there was one.
    pub fn finish_active(&self) -> bool {
        self.with_active(|command| command.registrar().finish())
    }

    /// Cancel the active command, discarding its provisional values.
    pub fn cancel_active(&self) -> bool {
        self.with_active(|command| command.registrar().cancel())
    }

    /// Interrupt the active command, keeping its committed values.
    pub fn interrupt_active(&self) -> bool {
        self.with_active(|command| {
            self.inner.preempted.set(true);
            command.registrar().interrupt();
        })
    }

    fn with_active(&self, f: impl FnOnce(&Rc<dyn Command>)) -> bool {
        let active = self.inner.active.borrow().clone();
        match active {
            Some(command) => {
                f(&command);
                true
            }
            None => false,
        }
    }

    /// Finish commands until nothing is active or queued.
    pub fn shutdown(&self) {
        self.run_until_stalled();
        while !self.is_idle() {
            if !self.finish_active() {
                tracing::warn!("executor busy with no active command");
                break;
            }
            self.run_until_stalled();
        }
    }

    #[must_use]
    pub fn active_title(&self) -> Option<&'static str> {
        self.inner.active.borrow().as_ref().map(|c| c.title())
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.inner.running.get()
    }

    /// Reports of every command that ended since the last call.
    pub fn take_reports(&self) -> Vec<CommandReport> {
        std::mem::take(&mut *self.inner.reports.borrow_mut())
    }
}

async fn drain(inner: Rc<ExecutorInner>) {
    loop {
        let next = inner.next.borrow_mut().take();
        let Some(command) = next else {
            break;
        };
        let report = run(&inner, command).await;
        inner.reports.borrow_mut().push(report);
    }
    inner.running.set(false);
}

async fn run(inner: &ExecutorInner, command: Rc<dyn Command>) -> CommandReport {
    let id = Uuid::new_v4();
    let title = command.title();
    inner.preempted.set(false);
    *inner.active.borrow_mut() = Some(Rc::clone(&command));
    tracing::info!(%id, title, "command started");

    let result = Rc::clone(&command).execute().await;
    let registrar = command.registrar();
    let preempted = inner.preempted.get();
    let outcome = match &result {
        Ok(()) => {
            registrar.finish();
            if preempted { Outcome::Interrupted } else { Outcome::Completed }
        }
        Err(err) if err.is_lifecycle() => {
            tracing::debug!(%id, title, error = %err, "command ended");
            registrar.cancel();
            if preempted { Outcome::Interrupted } else { Outcome::Cancelled }
        }
        Err(err) => {
            tracing::warn!(%id, title, error = %err, "command failed");
            registrar.cancel();
            Outcome::Failed
        }
    };
    inner.active.borrow_mut().take();

    let params = match command.report() {
        Ok(params) => params,
        Err(err) => {
            tracing::warn!(%id, title, error = %err, "command report not serializable");
            serde_json::Value::Null
        }
    };
    tracing::info!(%id, title, ?outcome, state = %registrar.state(), "command ended");
    CommandReport {
        id,
        title,
        outcome,
        error: result.err().map(|err| err.to_string()),
        state: registrar.state().to_string(),
        params,
    }
}
