//! Cooperative cancellation for interactive, single-threaded tools.
//!
//! Every modal interaction in the modeler (dragging a handle, typing a value,
//! picking a point) is represented as an [`Operation`]: a future with three
//! terminal verbs instead of the usual two. Commands own a [`Registrar`] that
//! cascades exactly one of those verbs to every resource they registered.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`operation`] | The cancellable future and its `all` / `resolve` combinators |
//! | [`registrar`] | Resource ownership tree and the [`Registrable`] capability |
//! | [`disposable`] | Idempotent cleanup actions and ordered bags of them |
//! | [`error`] | Lifecycle outcomes ([`OperationError`]) and registrar errors |
//! | [`state`] | The shared lifecycle [`State`] tag |

pub mod disposable;
pub mod error;
pub mod operation;
pub mod registrar;
pub mod state;

pub use disposable::{CompositeDisposable, Disposable};
pub use error::{OperationError, OperationId, RegistrarError};
pub use operation::{Hooks, Operation, Settler};
pub use registrar::{Registrable, Registrar};
pub use state::State;
