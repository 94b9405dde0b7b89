//! Lifecycle outcomes and registrar errors.
//!
//! DESIGN
//! ======
//! The three ways an interaction can end early are variants of a closed enum
//! rather than marker objects compared by identity. Each variant records the
//! [`OperationId`] that produced it, so an aggregate can report which
//! constituent ended the group even after its own cleanup cancelled the rest.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::State;

/// Identifies one [`Operation`](crate::Operation) for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(u64);

impl OperationId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Why an operation rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Explicit abort; any provisional value is discarded.
    #[error("{origin} cancelled")]
    Cancelled { origin: OperationId },
    /// Ended early by `finish` on a step that opted into `reject_on_finish`.
    #[error("{origin} finished before completing")]
    Finished { origin: OperationId },
    /// Taken over by another interaction on a step that opted into `reject_on_interrupt`.
    #[error("{origin} interrupted")]
    Interrupted { origin: OperationId },
    /// A genuine failure reported by the operation's own logic.
    #[error("{origin} failed: {reason}")]
    Failed { origin: OperationId, reason: String },
}

impl OperationError {
    /// The operation whose verb or logic produced this error.
    #[must_use]
    pub fn origin(&self) -> OperationId {
        match self {
            Self::Cancelled { origin }
            | Self::Finished { origin }
            | Self::Interrupted { origin }
            | Self::Failed { origin, .. } => *origin,
        }
    }

    #[must_use]
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether this is one of the three lifecycle endings rather than a failure.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// The state an operation settles into when it rejects with this error.
    #[must_use]
    pub fn terminal_state(&self) -> State {
        match self {
            Self::Finished { .. } => State::Finished,
            Self::Interrupted { .. } => State::Interrupted,
            Self::Cancelled { .. } | Self::Failed { .. } => State::Cancelled,
        }
    }
}

/// Error returned by [`Registrar`](crate::Registrar) once it has ended.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrarError {
    #[error("registrar already {state}")]
    AlreadyFinished { state: State },
}
