use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub(super) trait Owner: Send + Sync {
  fn id(&self) -> usize;
  fn unsubscribe(&self);
  fn closed(&self) -> bool;
  fn add_finalize(&self, task: Teardown);
}

/// Cleanup returned by an observable producer, run once when its subscription
/// closes
pub enum Teardown {
  None,
  Fn(Box<dyn FnOnce() + Send>),
  Subscription(Subscription),
}

impl Teardown {
  pub fn new<F>(task: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    Teardown::Fn(Box::new(task))
  }

  pub(super) fn run(self) {
    match self {
      Teardown::None => (),
      Teardown::Fn(task) => task(),
      Teardown::Subscription(mut subscription) => subscription.unsubscribe(),
    }
  }
}

impl From<Subscription> for Teardown {
  fn from(subscription: Subscription) -> Self {
    Teardown::Subscription(subscription)
  }
}

impl Debug for Teardown {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Teardown::None => write!(f, "Teardown::None"),
      Teardown::Fn(_) => write!(f, "Teardown::Fn"),
      Teardown::Subscription(subscription) => {
        write!(f, "Teardown::Subscription({:?})", subscription)
      }
    }
  }
}

/// Ties a running observable to the current scope
///
/// Dropping a subscription unsubscribes it, which closes the subscriber and
/// runs the producer's teardown. Use [detach](Subscription::detach) to let a
/// subscription outlive the scope it was created in.
pub struct Subscription {
  subscriber: Option<Arc<dyn Owner>>,
}

impl Subscription {
  pub(super) fn new(subscriber: Arc<dyn Owner>) -> Self {
    Subscription {
      subscriber: Some(subscriber),
    }
  }

  /// Stops delivery to the observer and runs the teardown, calling this more
  /// than once has no further effect
  pub fn unsubscribe(&mut self) {
    if let Some(subscriber) = self.subscriber.take() {
      subscriber.unsubscribe();
    }
  }

  /// Returns false once the subscription was unsubscribed or its observable
  /// terminated
  pub fn active(&self) -> bool {
    self
      .subscriber
      .as_ref()
      .map(|subscriber| !subscriber.closed())
      .unwrap_or(false)
  }

  /// Adds a task run once when the subscription closes, either through
  /// unsubscribe or a terminal notification
  ///
  /// # Example
  /// ```
  /// use tether::event::observable::Observable;
  /// use std::sync::Arc;
  /// use std::sync::atomic::{AtomicBool, Ordering};
  ///
  /// let finished = Arc::new(AtomicBool::new(false));
  /// let captured = finished.clone();
  /// {
  ///   let _subscription = Observable::<i32>::never()
  ///     .subscribe_next(|_| {})
  ///     .finalize(move || captured.store(true, Ordering::Relaxed));
  ///   assert_eq!(finished.load(Ordering::Relaxed), false);
  /// }
  /// assert_eq!(finished.load(Ordering::Relaxed), true);
  /// ```
  pub fn finalize<F>(self, task: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    match &self.subscriber {
      Some(subscriber) => subscriber.add_finalize(Teardown::new(task)),
      None => task(),
    }
    self
  }

  /// Releases the subscription without unsubscribing, it stays alive until
  /// its observable terminates or the producer lets go of it
  pub fn detach(mut self) {
    self.subscriber.take();
  }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match &self.subscriber {
      Some(subscriber) => write!(
        f,
        "Subscription {{ id: {}, active: {} }}",
        subscriber.id(),
        !subscriber.closed()
      ),
      None => write!(f, "Subscription {{ released }}"),
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.unsubscribe();
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::event::observable::Observable;

  use std::sync::atomic::{AtomicUsize, Ordering};

  fn counting(count: &Arc<AtomicUsize>) -> Observable<()> {
    let count = count.clone();
    Observable::new(move |_| {
      let count = count.clone();
      Teardown::new(move || {
        count.fetch_add(1, Ordering::Relaxed);
      })
    })
  }

  #[test]
  fn unsubscribe_idempotent_test() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut subscription = counting(&count).subscribe_next(|_| {});
    assert!(subscription.active());
    subscription.unsubscribe();
    subscription.unsubscribe();
    assert!(!subscription.active());
    drop(subscription);
    assert_eq!(count.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn drop_unsubscribes_test() {
    let count = Arc::new(AtomicUsize::new(0));
    {
      let _subscription = counting(&count).subscribe_next(|_| {});
      assert_eq!(count.load(Ordering::Relaxed), 0);
    }
    assert_eq!(count.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn detach_keeps_subscription_test() {
    let count = Arc::new(AtomicUsize::new(0));
    counting(&count).subscribe_next(|_| {}).detach();
    assert_eq!(count.load(Ordering::Relaxed), 0);
  }

  #[test]
  fn finalize_after_close_test() {
    let count = Arc::new(AtomicUsize::new(0));
    let clone = count.clone();
    let subscription = Observable::<i32>::of(vec![1])
      .subscribe_next(|_| {})
      .finalize(move || {
        clone.fetch_add(1, Ordering::Relaxed);
      });
    assert!(!subscription.active());
    assert_eq!(count.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn teardown_subscription_test() {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = counting(&count).subscribe_next(|_| {});
    Teardown::from(inner).run();
    assert_eq!(count.load(Ordering::Relaxed), 1);
  }
}
