use crate::machine::StateTag;

/// Faults raised while routing input through gizmos.
///
/// Every variant signals a programming or host error; they propagate out of
/// [`Viewport::dispatch`](crate::Viewport::dispatch) instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GizmoError {
    #[error("invalid transition: {event} in state {state}")]
    InvalidTransition { event: &'static str, state: StateTag },
    #[error("corrupt intersection query")]
    CorruptIntersection,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}
