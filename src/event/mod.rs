//! This module contains tether's event system. The module is organized into
//! the following sub modules:
//! * `observable` which implements the cold observable type - a lazy producer
//!   of next, error and complete notifications.
//! * `observer` which implements the consuming side of an observable and the
//!   [Subscriber](observer::Subscriber) handed to producers.
//! * `subscription` which implements the
//!   [Subscription](subscription::Subscription) type which is used to tie a
//!   running observable to the current scope.
//! * `context` which implements the execution contexts notifications can be
//!   re-homed into.
//! * `listener` which binds plugin style listeners to observables.
//! * `ops` which contains the observable pipe operators.
//!
pub mod context;
pub mod listener;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod subscription;
