//! A simple example of what tether has to offer: a plugin style listener is
//! bound to an observable, and every notification is re-homed onto a "ui"
//! worker thread.

use tether::event::context::WorkerContextBuilder;
use tether::event::listener::bind_listener;
use tether::event::ops::*;
use tether::utils::testing::MockPlugin;
use tether::ContextError;

#[derive(Debug, Clone)]
enum AppState {
  Active,
  Background,
}

impl std::fmt::Display for AppState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Active => write!(f, "app became active")?,
      Self::Background => write!(f, "app moved to the background")?,
    };
    Ok(())
  }
}

fn main() -> Result<(), ContextError> {
  let plugin = MockPlugin::new();
  let ui = WorkerContextBuilder::named("ui").build()?;
  let (tx, rx) = std::sync::mpsc::channel();
  let tx = std::sync::Mutex::new(tx);

  let mut subscription = bind_listener(plugin.clone(), "appStateChange")
    .wrap_in_context(ui)
    .subscribe_next(move |state: AppState| {
      let thread = std::thread::current();
      println!("{} (on thread '{}')", state, thread.name().unwrap_or("unknown"));
      let _ = tx.lock().map(|tx| tx.send(()));
    });

  plugin.fire(&"appStateChange", AppState::Background);
  plugin.fire(&"appStateChange", AppState::Active);
  for _ in 0..2 {
    let _ = rx.recv();
  }

  subscription.unsubscribe();
  println!(
    "listeners left after unsubscribe: {}",
    plugin.listener_count(&"appStateChange")
  );
  Ok(())
}
