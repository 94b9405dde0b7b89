//! Replay configuration, loaded from environment variables.
//!
//! Every knob has a default so the driver runs with an empty environment;
//! command-line flags override whatever the environment provides.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const DEFAULT_COMMAND: CommandKind = CommandKind::Extrude;
const DEFAULT_PERSISTENT: bool = false;
const DEFAULT_PRETTY: bool = false;

/// Which command the replay starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Extrude,
    Move,
    Rotate,
}

impl CommandKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extrude => "extrude",
            Self::Move => "move",
            Self::Rotate => "rotate",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command `{0}`; expected extrude, move or rotate")]
pub struct UnknownCommandKind(String);

impl FromStr for CommandKind {
    type Err = UnknownCommandKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extrude" => Ok(Self::Extrude),
            "move" => Ok(Self::Move),
            "rotate" => Ok(Self::Rotate),
            _ => Err(UnknownCommandKind(s.to_string())),
        }
    }
}

/// Knobs for one replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Command enqueued before the first step.
    pub command: CommandKind,
    /// Keep single-drag commands running after pointer-up until finished.
    pub persistent: bool,
    /// Pretty-print the JSON report.
    pub pretty: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { command: DEFAULT_COMMAND, persistent: DEFAULT_PERSISTENT, pretty: DEFAULT_PRETTY }
    }
}

impl ReplayConfig {
    pub fn from_env() -> Self {
        Self {
            command: env_parse("MODELER_COMMAND", DEFAULT_COMMAND),
            persistent: env_parse("MODELER_PERSISTENT", DEFAULT_PERSISTENT),
            pretty: env_parse("MODELER_PRETTY", DEFAULT_PRETTY),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
