use super::observable::ObservableType;
use super::subscription::{Owner, Teardown};

use log::trace;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// The consuming end of an observable
///
/// Observers receive zero or more `next` notifications followed by at most
/// one terminal `error` or `complete`. Every method takes `&self` so that an
/// observer may be re-entered from its own handlers.
pub trait Observer<T, E>: Send + Sync
where
  T: ObservableType,
  E: ObservableType,
{
  fn next(&self, value: T);
  fn error(&self, error: E);
  fn complete(&self);
}

/// A single captured notification of the observable protocol
#[derive(Clone, Debug, PartialEq)]
pub enum Notification<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  Next(T),
  Error(E),
  Complete,
}

impl<T, E> Notification<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  /// Replays this notification onto the given observer
  pub fn deliver(self, observer: &dyn Observer<T, E>) {
    match self {
      Notification::Next(value) => observer.next(value),
      Notification::Error(error) => observer.error(error),
      Notification::Complete => observer.complete(),
    }
  }

  pub fn is_terminal(&self) -> bool {
    !matches!(self, Notification::Next(_))
  }
}

type NextFn<T> = dyn Fn(T) + Send + Sync;
type ErrorFn<E> = dyn Fn(E) + Send + Sync;
type CompleteFn = dyn Fn() + Send + Sync;

/// Builds an [Observer] out of closures, any handler left unset ignores its
/// notification
///
/// # Example
/// ```
/// use tether::event::observable::Observable;
/// use tether::event::observer::ObserverBuilder;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// let done = Arc::new(AtomicBool::new(false));
/// let capture = done.clone();
/// let _subscription = Observable::<i32, String>::empty().subscribe(
///   ObserverBuilder::new()
///     .complete(move || capture.store(true, Ordering::Relaxed))
///     .build(),
/// );
/// assert!(done.load(Ordering::Relaxed));
/// ```
pub struct ObserverBuilder<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  next: Option<Box<NextFn<T>>>,
  error: Option<Box<ErrorFn<E>>>,
  complete: Option<Box<CompleteFn>>,
}

impl<T, E> Default for ObserverBuilder<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn default() -> Self {
    ObserverBuilder {
      next: None,
      error: None,
      complete: None,
    }
  }
}

impl<T, E> ObserverBuilder<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next<F>(mut self, next: F) -> Self
  where
    F: Fn(T) + Send + Sync + 'static,
  {
    self.next = Some(Box::new(next));
    self
  }

  pub fn error<F>(mut self, error: F) -> Self
  where
    F: Fn(E) + Send + Sync + 'static,
  {
    self.error = Some(Box::new(error));
    self
  }

  pub fn complete<F>(mut self, complete: F) -> Self
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.complete = Some(Box::new(complete));
    self
  }

  pub fn build(self) -> FnObserver<T, E> {
    FnObserver {
      next: self.next,
      error: self.error,
      complete: self.complete,
    }
  }
}

pub struct FnObserver<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  next: Option<Box<NextFn<T>>>,
  error: Option<Box<ErrorFn<E>>>,
  complete: Option<Box<CompleteFn>>,
}

impl<T, E> Observer<T, E> for FnObserver<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn next(&self, value: T) {
    if let Some(next) = &self.next {
      next(value);
    }
  }

  fn error(&self, error: E) {
    if let Some(handler) = &self.error {
      handler(error);
    }
  }

  fn complete(&self) {
    if let Some(complete) = &self.complete {
      complete();
    }
  }
}

pub(super) fn id() -> usize {
  static ID: AtomicUsize = AtomicUsize::new(0);
  ID.fetch_add(1, Ordering::Relaxed)
}

pub(super) fn lock<A>(mutex: &Mutex<A>) -> MutexGuard<'_, A> {
  mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct SubscriberInner<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  id: usize,
  observer: Box<dyn Observer<T, E>>,
  closed: AtomicBool,
  finalize: Mutex<Vec<Teardown>>,
}

impl<T, E> SubscriberInner<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  /// Flips the closed flag, returns true for the caller that closed it
  fn shut(&self) -> bool {
    !self.closed.swap(true, Ordering::AcqRel)
  }

  fn finalize(&self) {
    let tasks = std::mem::take(&mut *lock(&self.finalize));
    for task in tasks {
      task.run();
    }
  }
}

/// Finalizes a subscriber once its terminal handler returns or unwinds
struct FinalizeGuard<'a, T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  inner: &'a SubscriberInner<T, E>,
}

impl<'a, T, E> Drop for FinalizeGuard<'a, T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn drop(&mut self) {
    self.inner.finalize();
  }
}

impl<T, E> Owner for SubscriberInner<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn id(&self) -> usize {
    self.id
  }

  fn unsubscribe(&self) {
    if self.shut() {
      trace!("subscriber {} unsubscribed", self.id);
      self.finalize();
    }
  }

  fn closed(&self) -> bool {
    self.closed.load(Ordering::Acquire)
  }

  fn add_finalize(&self, task: Teardown) {
    let mut guard = lock(&self.finalize);
    if self.closed() {
      drop(guard);
      task.run();
    } else {
      guard.push(task);
    }
  }
}

/// The producer side handle of a single subscription
///
/// A subscriber enforces the observable protocol on behalf of its observer:
/// notifications arriving after a terminal notification or after the
/// subscription was torn down are dropped.
pub struct Subscriber<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  inner: Arc<SubscriberInner<T, E>>,
}

impl<T, E> Clone for Subscriber<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn clone(&self) -> Self {
    Subscriber {
      inner: self.inner.clone(),
    }
  }
}

impl<T, E> Subscriber<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  pub(super) fn new(observer: Box<dyn Observer<T, E>>) -> Self {
    Subscriber {
      inner: Arc::new(SubscriberInner {
        id: id(),
        observer,
        closed: AtomicBool::new(false),
        finalize: Mutex::new(Vec::new()),
      }),
    }
  }

  pub(super) fn owner(&self) -> Arc<dyn Owner> {
    self.inner.clone()
  }

  pub fn id(&self) -> usize {
    self.inner.id
  }

  pub fn closed(&self) -> bool {
    self.inner.closed()
  }

  pub fn next(&self, value: T) {
    if self.closed() {
      trace!("subscriber {} dropped a late value", self.inner.id);
    } else {
      self.inner.observer.next(value);
    }
  }

  pub fn error(&self, error: E) {
    if self.inner.shut() {
      let _guard = FinalizeGuard { inner: &*self.inner };
      self.inner.observer.error(error);
    }
  }

  pub fn complete(&self) {
    if self.inner.shut() {
      let _guard = FinalizeGuard { inner: &*self.inner };
      self.inner.observer.complete();
    }
  }

  /// Registers cleanup to run once this subscriber closes, runs it
  /// immediately when the subscriber is already closed
  pub fn add_teardown(&self, teardown: Teardown) {
    self.inner.add_finalize(teardown);
  }
}

impl<T, E> Observer<T, E> for Subscriber<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn next(&self, value: T) {
    Subscriber::next(self, value)
  }

  fn error(&self, error: E) {
    Subscriber::error(self, error)
  }

  fn complete(&self) {
    Subscriber::complete(self)
  }
}
