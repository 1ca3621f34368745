use super::observer::{Observer, ObserverBuilder, Subscriber};
use super::subscription::{Subscription, Teardown};

use log::trace;

use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub trait ObservableType: Send + Sync + Clone + Debug + 'static {}

impl<T> ObservableType for T where T: Send + Sync + Clone + Debug + 'static {}

type ProducerFn<T, E> = dyn Fn(Subscriber<T, E>) -> Teardown + Send + Sync;

/// A lazy producer of `next`, `error` and `complete` notifications
///
/// - An observable is cold: nothing happens until it is subscribed to, and
///   every subscription runs the producer again with fresh state. Nothing is
///   shared between two subscriptions of the same observable.
/// - The producer runs on the subscribing thread. Notifications are delivered
///   on whatever thread the producer emits them from.
/// - Cloning an observable is cheap, clones share the producer.
///
/// # Example
/// ```
/// use tether::event::observable::Observable;
/// use tether::event::subscription::Teardown;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let capture = seen.clone();
/// let observable = Observable::<i32, String>::new(|subscriber| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
///   Teardown::None
/// });
/// let _subscription = observable.subscribe_next(move |x| {
///   capture.lock().unwrap().push(x);
/// });
/// assert_eq!(*seen.lock().unwrap(), [1, 2]);
/// ```
pub struct Observable<T, E = Infallible>
where
  T: ObservableType,
  E: ObservableType,
{
  producer: Arc<ProducerFn<T, E>>,
}

impl<T, E> Clone for Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn clone(&self) -> Self {
    Observable {
      producer: self.producer.clone(),
    }
  }
}

impl<T, E> Debug for Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Observable<{}>", std::any::type_name::<T>())
  }
}

impl<T, E> Observable<T, E>
where
  T: ObservableType,
  E: ObservableType,
{
  /// Constructs an observable from a producer
  ///
  /// The producer is called once per subscription with the
  /// [Subscriber](super::observer::Subscriber) of that subscription and
  /// returns the teardown to run when the subscription closes.
  pub fn new<F>(producer: F) -> Self
  where
    F: Fn(Subscriber<T, E>) -> Teardown + Send + Sync + 'static,
  {
    Observable {
      producer: Arc::new(producer),
    }
  }

  /// Constructs an observable emitting each value of a list in order, then
  /// completing
  ///
  /// # Example
  /// ```
  /// use tether::event::observable::Observable;
  /// use tether::event::ops::*;
  ///
  /// let rx = Observable::<i32>::of(vec![1, 2, 3]).collect();
  /// assert_eq!(rx.recv().unwrap().unwrap(), [1, 2, 3]);
  /// ```
  pub fn of(list: Vec<T>) -> Self {
    let list = Arc::new(list);
    Observable::new(move |subscriber| {
      for value in list.iter() {
        if subscriber.closed() {
          return Teardown::None;
        }
        subscriber.next(value.clone());
      }
      subscriber.complete();
      Teardown::None
    })
  }

  /// Constructs an observable which completes as soon as it is subscribed to
  pub fn empty() -> Self {
    Observable::new(|subscriber| {
      subscriber.complete();
      Teardown::None
    })
  }

  /// Constructs an observable which errors with `error` as soon as it is
  /// subscribed to
  pub fn throw(error: E) -> Self {
    Observable::new(move |subscriber| {
      subscriber.error(error.clone());
      Teardown::None
    })
  }

  /// Constructs an observable which never emits anything
  pub fn never() -> Self {
    Observable::new(|_| Teardown::None)
  }

  /// Subscribes an observer, running the producer on the calling thread
  ///
  /// A panic raised by the producer is not caught, it unwinds into the caller
  /// of `subscribe`.
  pub fn subscribe<O>(&self, observer: O) -> Subscription
  where
    O: Observer<T, E> + 'static,
  {
    let subscriber = Subscriber::new(Box::new(observer));
    trace!("subscriber {} subscribing", subscriber.id());
    let teardown = (self.producer)(subscriber.clone());
    subscriber.add_teardown(teardown);
    Subscription::new(subscriber.owner())
  }

  /// Subscribes a consumer of values only, errors and completion are ignored
  pub fn subscribe_next<F>(&self, consumer: F) -> Subscription
  where
    F: Fn(T) + Send + Sync + 'static,
  {
    self.subscribe(ObserverBuilder::new().next(consumer).build())
  }

  /// Applies an operator to this observable
  ///
  /// # Example
  /// ```
  /// use tether::event::context::Immediate;
  /// use tether::event::observable::Observable;
  /// use tether::event::ops::*;
  ///
  /// let rx = Observable::<i32>::of(vec![1, 2])
  ///   .pipe(wrap_in_context(Immediate))
  ///   .collect();
  /// assert_eq!(rx.recv().unwrap().unwrap(), [1, 2]);
  /// ```
  pub fn pipe<U, F, Op>(self, operator: Op) -> Observable<U, F>
  where
    U: ObservableType,
    F: ObservableType,
    Op: FnOnce(Self) -> Observable<U, F>,
  {
    operator(self)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::event::observer::Notification;

  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  fn record<T, E>(
    observable: &Observable<T, E>,
  ) -> (Subscription, Arc<Mutex<Vec<Notification<T, E>>>>)
  where
    T: ObservableType,
    E: ObservableType,
  {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (next, error, complete) = (log.clone(), log.clone(), log.clone());
    let subscription = observable.subscribe(
      ObserverBuilder::new()
        .next(move |x| next.lock().unwrap().push(Notification::Next(x)))
        .error(move |e| error.lock().unwrap().push(Notification::Error(e)))
        .complete(move || complete.lock().unwrap().push(Notification::Complete))
        .build(),
    );
    (subscription, log)
  }

  #[test]
  fn observable_of_test() {
    let (subscription, log) = record(&Observable::<i32>::of(vec![1, 2, 3]));
    assert!(!subscription.active());
    assert_eq!(
      *log.lock().unwrap(),
      [
        Notification::Next(1),
        Notification::Next(2),
        Notification::Next(3),
        Notification::Complete
      ]
    );
  }

  #[test]
  fn observable_empty_test() {
    let (_subscription, log) = record(&Observable::<i32>::empty());
    assert_eq!(*log.lock().unwrap(), [Notification::Complete]);
  }

  #[test]
  fn observable_throw_test() {
    let (_subscription, log) =
      record(&Observable::<i32, String>::throw("An Error".to_owned()));
    assert_eq!(
      *log.lock().unwrap(),
      [Notification::Error("An Error".to_owned())]
    );
  }

  #[test]
  fn observable_never_test() {
    let (subscription, log) = record(&Observable::<i32>::never());
    assert!(subscription.active());
    assert!(log.lock().unwrap().is_empty());
  }

  #[test]
  fn observable_cold_test() {
    let calls = Arc::new(AtomicUsize::new(0));
    let clone = calls.clone();
    let observable = Observable::<usize>::new(move |subscriber| {
      subscriber.next(clone.fetch_add(1, Ordering::Relaxed));
      Teardown::None
    });
    let (_a, first) = record(&observable);
    let (_b, second) = record(&observable.clone());
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(*first.lock().unwrap(), [Notification::Next(0)]);
    assert_eq!(*second.lock().unwrap(), [Notification::Next(1)]);
  }

  #[test]
  fn observable_unsubscribe_in_next_test() {
    let holder: Arc<Mutex<Option<Subscriber<i32, Infallible>>>> =
      Arc::new(Mutex::new(None));
    let capture = holder.clone();
    let observable = Observable::<i32>::new(move |subscriber| {
      *capture.lock().unwrap() = Some(subscriber);
      Teardown::None
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let clone = seen.clone();
    let mut subscription =
      observable.subscribe_next(move |x| clone.lock().unwrap().push(x));
    let subscriber = holder.lock().unwrap().take().unwrap();
    subscriber.next(1);
    subscription.unsubscribe();
    subscriber.next(2);
    assert_eq!(*seen.lock().unwrap(), [1]);
  }
}
