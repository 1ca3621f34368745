//! Tether is:
//! * a bridge turning callback based plugin listeners into lazy observables.
//! * an operator re-homing every observable notification inside an execution
//!   context, such as the change tracking scope of a UI framework.
//!
//! Both adapters are built on a small cold observable type found in
//! [event::observable].
#[macro_use]
extern crate lazy_static;

pub mod error;
pub mod event;
pub mod sync;
pub mod utils;

pub use error::ContextError;
pub use event::context::{ExecutionContext, Immediate, WorkerContext};
pub use event::listener::{bind_listener, ListenerHandle, Registrar};
pub use event::observable::Observable;
pub use event::ops::{wrap_in_context, WrapInContext};
pub use event::subscription::Subscription;
