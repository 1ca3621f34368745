//! Tether synchronization mechanisms.
//!
//! Only the worker thread backing
//! [WorkerContext](crate::event::context::WorkerContext) lives here. The
//! adapters never spawn threads of their own.
pub mod worker;
