//! Errors raised by tether's execution contexts.
//!
//! The adapters themselves never produce errors: upstream errors travel as
//! observable notifications and panics propagate untouched. Only the worker
//! backed context can fail, when its thread cannot be started or has died.
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
  /// The worker thread panicked while running earlier work.
  #[error("context '{name}' is unhealthy, its worker panicked")]
  Unhealthy { name: String },

  /// The worker thread could not be spawned.
  #[error("context '{name}' failed to spawn its worker: {reason}")]
  Spawn { name: String, reason: String },
}

impl ContextError {
  /// Returns a short stable label for log records.
  ///
  /// # Example
  /// ```
  /// use tether::ContextError;
  ///
  /// let error = ContextError::Spawn {
  ///   name: "ui".to_owned(),
  ///   reason: "out of threads".to_owned(),
  /// };
  /// assert_eq!(error.as_label(), "context_spawn_failed");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      ContextError::Unhealthy { .. } => "context_unhealthy",
      ContextError::Spawn { .. } => "context_spawn_failed",
    }
  }
}
