use tether::event::context::{ExecutionContext, Runtime};
use tether::utils::testing;

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

#[test]
fn runtime_test() {
  testing::async_context(|| {
    let counter = Arc::new(AtomicI32::new(0));
    let (tx, rx) = std::sync::mpsc::channel();
    for _ in 0..100 {
      let cloned = counter.clone();
      Runtime.run(Box::new(move || {
        cloned.fetch_add(1, Ordering::Relaxed);
      }));
    }
    Runtime.run(Box::new(move || tx.send(()).unwrap()));
    rx.recv().unwrap();
    assert_eq!(counter.load(Ordering::Relaxed), 100);
    while !Runtime::done() {}
  });
}
