use super::observable::{Observable, ObservableType};
use super::subscription::Teardown;

use log::debug;

use std::fmt::Debug;
use std::sync::Arc;

/// The callback a registrar delivers event payloads to
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Handle returned when registering a listener, removing it stops delivery
///
/// Implementations should make `remove` idempotent. Any `FnMut()` closure is
/// a handle.
pub trait ListenerHandle: Send + 'static {
  fn remove(&mut self);
}

impl<F> ListenerHandle for F
where
  F: FnMut() + Send + 'static,
{
  fn remove(&mut self) {
    self()
  }
}

/// A push based event source listeners can be registered on, keyed by an
/// event identifier
///
/// Any `Fn(K, Listener<T>) -> H` closure is a registrar, which lets a plugin
/// method such as `add_listener` be handed over directly.
pub trait Registrar<K, T>: Send + Sync + 'static
where
  T: ObservableType,
{
  type Handle: ListenerHandle;

  fn add_listener(&self, event: K, listener: Listener<T>) -> Self::Handle;
}

impl<K, T, H, F> Registrar<K, T> for F
where
  T: ObservableType,
  H: ListenerHandle,
  F: Fn(K, Listener<T>) -> H + Send + Sync + 'static,
{
  type Handle = H;

  fn add_listener(&self, event: K, listener: Listener<T>) -> H {
    self(event, listener)
  }
}

/// Binds a listener registration to a lazy observable of the event's payloads
///
/// - Every subscription registers its own listener for `event`, exactly once,
///   and forwards each payload as a `next` notification. Subscriptions never
///   share a listener; multicast outside the observable when needed.
/// - Unsubscribing, or dropping the [Subscription](super::subscription::Subscription),
///   removes that listener exactly once. Payloads delivered after removal are
///   dropped.
/// - The observable never completes and never errors on its own.
/// - A panic raised by the registrar unwinds into the caller of `subscribe`.
///
/// # Example
/// ```
/// use tether::event::listener::{bind_listener, Listener};
/// use tether::event::ops::*;
/// use std::sync::{Arc, Mutex};
///
/// let listeners: Arc<Mutex<Vec<Listener<String>>>> = Arc::default();
/// let registry = listeners.clone();
/// let events = bind_listener(
///   move |_event: &'static str, listener: Listener<String>| {
///     registry.lock().unwrap().push(listener);
///     || {}
///   },
///   "pushNotificationReceived",
/// );
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let capture = seen.clone();
/// let _subscription = events.subscribe_next(move |x| capture.lock().unwrap().push(x));
/// for listener in listeners.lock().unwrap().iter() {
///   listener("hello".to_owned());
/// }
/// assert_eq!(*seen.lock().unwrap(), ["hello"]);
/// ```
pub fn bind_listener<K, T, R>(registrar: R, event: K) -> Observable<T>
where
  K: Clone + Debug + Send + Sync + 'static,
  T: ObservableType,
  R: Registrar<K, T>,
{
  Observable::new(move |subscriber| {
    debug!("adding listener for event {:?}", event);
    let forward = subscriber.clone();
    let mut handle = registrar
      .add_listener(event.clone(), Arc::new(move |value| forward.next(value)));
    let event = event.clone();
    Teardown::new(move || {
      debug!("removing listener for event {:?}", event);
      handle.remove();
    })
  })
}
