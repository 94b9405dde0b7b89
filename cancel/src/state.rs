#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::fmt;

/// Lifecycle position of an [`Operation`](crate::Operation) or
/// [`Registrar`](crate::Registrar).
///
/// Operations never enter `Awaiting`; it marks a registrar whose owner has
/// asked for the combined completion of its operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// Running; no terminal verb has been applied yet.
    #[default]
    None,
    /// The owner is waiting on every registered operation to settle.
    Awaiting,
    /// Ended by `cancel` or by a rejection.
    Cancelled,
    /// Ended by `finish` or by natural success.
    Finished,
    /// Ended by `interrupt`.
    Interrupted,
}

impl State {
    /// Whether a terminal verb has already been applied.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Finished | Self::Interrupted)
    }

    /// Whether terminal verbs are still accepted.
    #[must_use]
    pub fn is_live(self) -> bool {
        !self.is_terminal()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Awaiting => "awaiting",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
