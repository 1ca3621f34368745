use super::context::ExecutionContext;
use super::observable::{Observable, ObservableType};
use super::observer::ObserverBuilder;
use super::subscription::Teardown;

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

/// Returns an operator re-emitting every notification of its source inside
/// `context`
///
/// Each `next`, `error` and `complete` is handed to
/// [run](ExecutionContext::run) as its own unit of work carrying the original
/// value or error. Notifications are never merged, and their order is kept as
/// long as the context runs work in the order it receives it. Subscribing to
/// the wrapped observable subscribes to the source, unsubscribing from it
/// unsubscribes from the source.
///
/// A panic raised by the context while running a notification unwinds through
/// the notifying producer, it is not turned into an `error` notification.
///
/// # Example
/// ```
/// use tether::event::context::Immediate;
/// use tether::event::observable::Observable;
/// use tether::event::ops::*;
///
/// let rx = Observable::<i32, String>::throw("An Error".to_owned())
///   .pipe(wrap_in_context(Immediate))
///   .collect();
/// assert_eq!(rx.recv().unwrap(), Err("An Error".to_owned()));
/// ```
pub fn wrap_in_context<T, E, C>(
  context: C,
) -> impl FnOnce(Observable<T, E>) -> Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
  C: ExecutionContext + 'static,
{
  let context = Arc::new(context);
  move |source: Observable<T, E>| {
    Observable::new(move |subscriber| {
      let (next_context, error_context, complete_context) =
        (context.clone(), context.clone(), context.clone());
      let (next_to, error_to, complete_to) =
        (subscriber.clone(), subscriber.clone(), subscriber);
      let observer = ObserverBuilder::new()
        .next(move |x| {
          let to = next_to.clone();
          next_context.run(Box::new(move || to.next(x)));
        })
        .error(move |err| {
          let to = error_to.clone();
          error_context.run(Box::new(move || to.error(err)));
        })
        .complete(move || {
          let to = complete_to.clone();
          complete_context.run(Box::new(move || to.complete()));
        })
        .build();
      Teardown::from(source.subscribe(observer))
    })
  }
}

pub trait WrapInContext<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  /// Wraps this observable so that every notification is delivered inside
  /// `context`, see [wrap_in_context] for details
  ///
  /// # Example
  /// ```
  /// use tether::event::context::WorkerContextBuilder;
  /// use tether::event::observable::Observable;
  /// use tether::event::ops::*;
  ///
  /// let zone = WorkerContextBuilder::named("zone").build().unwrap();
  /// let rx = Observable::<i32>::of(vec![1, 2, 3])
  ///   .wrap_in_context(zone)
  ///   .tap(|_| assert_eq!(std::thread::current().name(), Some("zone")))
  ///   .collect();
  /// assert_eq!(rx.recv().unwrap().unwrap(), [1, 2, 3]);
  /// ```
  fn wrap_in_context<C>(&self, context: C) -> Observable<T, E>
  where
    C: ExecutionContext + 'static;
}

impl<T, E> WrapInContext<T, E> for Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn wrap_in_context<C>(&self, context: C) -> Observable<T, E>
  where
    C: ExecutionContext + 'static,
  {
    self.clone().pipe(wrap_in_context(context))
  }
}

pub trait Tap<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  /// Runs `tap` on every value before passing it on unchanged
  ///
  /// # Example
  /// ```
  /// use tether::event::observable::Observable;
  /// use tether::event::ops::*;
  /// use std::sync::Arc;
  /// use std::sync::atomic::{AtomicI32, Ordering};
  ///
  /// let sum = Arc::new(AtomicI32::new(0));
  /// let capture = sum.clone();
  /// let rx = Observable::<i32>::of(vec![1, 2, 3])
  ///   .tap(move |x| {
  ///     capture.fetch_add(*x, Ordering::Relaxed);
  ///   })
  ///   .collect();
  /// assert_eq!(rx.recv().unwrap().unwrap(), [1, 2, 3]);
  /// assert_eq!(sum.load(Ordering::Relaxed), 6);
  /// ```
  fn tap<F>(&self, tap: F) -> Observable<T, E>
  where
    F: Fn(&T) + Send + Sync + 'static;
}

impl<T, E> Tap<T, E> for Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn tap<F>(&self, tap: F) -> Observable<T, E>
  where
    F: Fn(&T) + Send + Sync + 'static,
  {
    let source = self.clone();
    let tap = Arc::new(tap);
    Observable::new(move |subscriber| {
      let tap = tap.clone();
      let (next_to, error_to, complete_to) =
        (subscriber.clone(), subscriber.clone(), subscriber);
      Teardown::from(
        source.subscribe(
          ObserverBuilder::new()
            .next(move |x| {
              tap(&x);
              next_to.next(x);
            })
            .error(move |err| error_to.error(err))
            .complete(move || complete_to.complete())
            .build(),
        ),
      )
    })
  }
}

pub trait Collect<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  /// Subscribes and gathers every value, the receiver yields once the
  /// observable terminates
  ///
  /// The subscription is detached: it lives until the observable terminates,
  /// an observable which never terminates never yields.
  fn collect(&self) -> Receiver<Result<Vec<T>, E>>;
}

impl<T, E> Collect<T, E> for Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn collect(&self) -> Receiver<Result<Vec<T>, E>> {
    let result = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = std::sync::mpsc::channel();
    let tx = Arc::new(Mutex::new(tx));
    let (push, finish) = (result.clone(), result);
    let error_tx = tx.clone();
    self
      .subscribe(
        ObserverBuilder::new()
          .next(move |x| {
            push.lock().unwrap_or_else(|p| p.into_inner()).push(x);
          })
          .error(move |err| {
            let guard = error_tx.lock().unwrap_or_else(|p| p.into_inner());
            let _ = guard.send(Err(err));
          })
          .complete(move || {
            let mut guard = finish.lock().unwrap_or_else(|p| p.into_inner());
            let values = std::mem::take(&mut *guard);
            drop(guard);
            let guard = tx.lock().unwrap_or_else(|p| p.into_inner());
            let _ = guard.send(Ok(values));
          })
          .build(),
      )
      .detach();
    rx
  }
}
