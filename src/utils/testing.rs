use crate::event::context::{ExecutionContext, Work};
use crate::event::listener::{Listener, ListenerHandle, Registrar};
use crate::event::observable::ObservableType;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, Weak};
use std::{thread, time::Duration};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn panic_after<T, F>(d: Duration, f: F) -> T
where
  T: Send + 'static,
  F: FnOnce() -> T + Send + 'static,
{
  let (done_tx, done_rx) = mpsc::channel();
  let handle = thread::Builder::new()
    .name("testing-thread".to_owned())
    .spawn(move || {
      let val = f();
      done_tx.send(()).expect("failed to send complete signal");
      val
    })
    .expect("failed to spawn testing thread");
  match done_rx.recv_timeout(d) {
    Ok(_) => handle.join().expect("thread panicked"),
    Err(error) => match error {
      mpsc::RecvTimeoutError::Timeout => panic!("thread took too long"),
      mpsc::RecvTimeoutError::Disconnected => panic!("thread panicked"),
    },
  }
}

/// Runs `f` on a separate thread, panicking if it does not finish within
/// [DEFAULT_TIMEOUT]
pub fn async_context<T, F>(f: F) -> T
where
  T: Send + 'static,
  F: FnOnce() -> T + Send + 'static,
{
  panic_after(DEFAULT_TIMEOUT, f)
}

/// An execution context which runs work inline and counts every run
#[derive(Clone, Default)]
pub struct MockContext {
  runs: Arc<AtomicUsize>,
  depth: Arc<AtomicUsize>,
}

impl MockContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of times `run` was called
  pub fn runs(&self) -> usize {
    self.runs.load(Ordering::SeqCst)
  }

  /// True while work handed to this context is running
  pub fn inside(&self) -> bool {
    self.depth.load(Ordering::SeqCst) > 0
  }
}

impl ExecutionContext for MockContext {
  fn run(&self, work: Work) {
    self.runs.fetch_add(1, Ordering::SeqCst);
    self.depth.fetch_add(1, Ordering::SeqCst);
    work();
    self.depth.fetch_sub(1, Ordering::SeqCst);
  }
}

struct PluginState<K, T>
where
  T: ObservableType,
{
  next_id: usize,
  listeners: Vec<(usize, K, Listener<T>)>,
  added: usize,
  removed: usize,
}

fn lock<K, T>(state: &Mutex<PluginState<K, T>>) -> MutexGuard<'_, PluginState<K, T>>
where
  T: ObservableType,
{
  state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A fake plugin holding listeners per event and firing payloads on demand
///
/// # Example
/// ```
/// use tether::event::listener::bind_listener;
/// use tether::utils::testing::MockPlugin;
/// use std::sync::{Arc, Mutex};
///
/// let plugin = MockPlugin::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let capture = seen.clone();
/// let mut subscription = bind_listener(plugin.clone(), "appStateChange")
///   .subscribe_next(move |active: bool| capture.lock().unwrap().push(active));
/// plugin.fire(&"appStateChange", true);
/// subscription.unsubscribe();
/// plugin.fire(&"appStateChange", false);
/// assert_eq!(*seen.lock().unwrap(), [true]);
/// assert_eq!(plugin.removed(), 1);
/// ```
pub struct MockPlugin<K, T>
where
  T: ObservableType,
{
  state: Arc<Mutex<PluginState<K, T>>>,
}

impl<K, T> Clone for MockPlugin<K, T>
where
  T: ObservableType,
{
  fn clone(&self) -> Self {
    MockPlugin {
      state: self.state.clone(),
    }
  }
}

impl<K, T> Default for MockPlugin<K, T>
where
  T: ObservableType,
{
  fn default() -> Self {
    MockPlugin {
      state: Arc::new(Mutex::new(PluginState {
        next_id: 0,
        listeners: Vec::new(),
        added: 0,
        removed: 0,
      })),
    }
  }
}

impl<K, T> MockPlugin<K, T>
where
  K: PartialEq,
  T: ObservableType,
{
  pub fn new() -> Self {
    Self::default()
  }

  /// Delivers `value` to every listener registered for `event`
  pub fn fire(&self, event: &K, value: T) {
    let listeners: Vec<Listener<T>> = lock(&self.state)
      .listeners
      .iter()
      .filter(|(_, key, _)| key == event)
      .map(|(_, _, listener)| listener.clone())
      .collect();
    for listener in listeners {
      listener(value.clone());
    }
  }

  pub fn listener_count(&self, event: &K) -> usize {
    lock(&self.state)
      .listeners
      .iter()
      .filter(|(_, key, _)| key == event)
      .count()
  }

  /// Number of listeners ever registered
  pub fn added(&self) -> usize {
    lock(&self.state).added
  }

  /// Number of calls made to a handle's `remove`
  pub fn removed(&self) -> usize {
    lock(&self.state).removed
  }
}

impl<K, T> Registrar<K, T> for MockPlugin<K, T>
where
  K: Send + Sync + 'static,
  T: ObservableType,
{
  type Handle = MockHandle<K, T>;

  fn add_listener(&self, event: K, listener: Listener<T>) -> MockHandle<K, T> {
    let mut guard = lock(&self.state);
    let id = guard.next_id;
    guard.next_id += 1;
    guard.added += 1;
    guard.listeners.push((id, event, listener));
    MockHandle {
      id,
      state: Arc::downgrade(&self.state),
    }
  }
}

pub struct MockHandle<K, T>
where
  T: ObservableType,
{
  id: usize,
  state: Weak<Mutex<PluginState<K, T>>>,
}

impl<K, T> ListenerHandle for MockHandle<K, T>
where
  K: Send + Sync + 'static,
  T: ObservableType,
{
  fn remove(&mut self) {
    if let Some(state) = self.state.upgrade() {
      let mut guard = lock(&state);
      guard.removed += 1;
      let id = self.id;
      guard.listeners.retain(|(listener, _, _)| *listener != id);
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  #[should_panic]
  fn panic_after_timeout_test() {
    panic_after(Duration::from_secs(0), || {
      std::thread::sleep(Duration::from_secs(1));
    });
  }

  #[test]
  fn mock_context_counts_test() {
    let context = MockContext::new();
    let probe = context.clone();
    context.run(Box::new(move || assert!(probe.inside())));
    assert!(!context.inside());
    assert_eq!(context.runs(), 1);
  }

  #[test]
  fn mock_plugin_remove_test() {
    let plugin = MockPlugin::<u8, u8>::new();
    let count = Arc::new(AtomicUsize::new(0));
    let clone = count.clone();
    let mut handle = plugin.add_listener(
      1,
      Arc::new(move |x: u8| {
        clone.fetch_add(x as usize, Ordering::Relaxed);
      }),
    );
    plugin.fire(&1, 3);
    plugin.fire(&2, 5);
    handle.remove();
    plugin.fire(&1, 7);
    assert_eq!(count.load(Ordering::Relaxed), 3);
    assert_eq!(plugin.listener_count(&1), 0);
    assert_eq!(plugin.removed(), 1);
  }
}
