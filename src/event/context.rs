use crate::error::ContextError;
use crate::sync::worker::Worker;

use log::{debug, error};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A unit of work handed to an execution context
pub type Work = Box<dyn FnOnce() + Send>;

/// An ambient scope work can be run inside of
///
/// Whether `run` executes the work synchronously or defers it is up to the
/// implementation. Contexts which defer must run work in the order it was
/// handed to them.
///
/// # Example
/// ```
/// use tether::event::context::{ExecutionContext, Work};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Tracked {
///   depth: AtomicUsize,
/// }
///
/// impl ExecutionContext for Tracked {
///   fn run(&self, work: Work) {
///     self.depth.fetch_add(1, Ordering::Relaxed);
///     work();
///     self.depth.fetch_sub(1, Ordering::Relaxed);
///   }
/// }
///
/// Tracked::default().run(Box::new(|| println!("inside")));
/// ```
pub trait ExecutionContext: Send + Sync {
  fn run(&self, work: Work);
}

impl<C> ExecutionContext for Arc<C>
where
  C: ExecutionContext + ?Sized,
{
  fn run(&self, work: Work) {
    (**self).run(work)
  }
}

/// Runs work synchronously on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl ExecutionContext for Immediate {
  fn run(&self, work: Work) {
    work();
  }
}

/// Runs work in order on a dedicated, named thread
///
/// Work handed to a worker context whose thread panicked is dropped and
/// logged, use [try_run](WorkerContext::try_run) to observe the failure.
#[derive(Clone)]
pub struct WorkerContext {
  worker: Worker,
}

impl WorkerContext {
  /// Hands work to the worker thread, failing once the worker has panicked
  pub fn try_run(&self, work: Work) -> Result<(), ContextError> {
    self.worker.submit(work)
  }

  pub fn name(&self) -> &str {
    self.worker.name()
  }

  /// Returns true when no submitted work is pending
  pub fn idle(&self) -> bool {
    self.worker.idle()
  }

  pub fn healthy(&self) -> bool {
    self.worker.healthy()
  }
}

impl ExecutionContext for WorkerContext {
  fn run(&self, work: Work) {
    if let Err(err) = self.try_run(work) {
      error!("{}: dropping work, {}", err.as_label(), err);
    }
  }
}

pub struct WorkerContextBuilder {
  name: String,
  stack_size: Option<usize>,
}

impl Default for WorkerContextBuilder {
  fn default() -> Self {
    static ID: AtomicUsize = AtomicUsize::new(0);
    WorkerContextBuilder {
      name: format!("context{}", ID.fetch_add(1, Ordering::Relaxed)),
      stack_size: None,
    }
  }
}

impl WorkerContextBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn named<S>(name: S) -> Self
  where
    S: Into<String>,
  {
    WorkerContextBuilder {
      name: name.into(),
      stack_size: None,
    }
  }

  pub fn stack_size(mut self, bytes: usize) -> Self {
    self.stack_size = Some(bytes);
    self
  }

  pub fn build(self) -> Result<WorkerContext, ContextError> {
    let (worker, _handle) = Worker::spawn(self.name, self.stack_size)?;
    Ok(WorkerContext { worker })
  }
}

lazy_static! {
  static ref RUNTIME: Option<WorkerContext> =
    match WorkerContextBuilder::named("runtime").build() {
      Ok(context) => Some(context),
      Err(err) => {
        error!("{}: {}", err.as_label(), err);
        None
      }
    };
}

/// The process wide worker context, its thread is started on first use
#[derive(Clone, Copy, Debug, Default)]
pub struct Runtime;

impl Runtime {
  /// Returns true when the runtime has no pending work
  pub fn done() -> bool {
    RUNTIME.as_ref().map(WorkerContext::idle).unwrap_or(true)
  }
}

impl ExecutionContext for Runtime {
  fn run(&self, work: Work) {
    match RUNTIME.as_ref() {
      Some(context) => context.run(work),
      None => error!("runtime unavailable, dropping work"),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContextType {
  Immediate,
  Worker,
  Runtime,
}

/// Constructs a context of the given type, `name` names the thread of a
/// `Worker` context and is ignored otherwise
pub fn make_context(
  name: String,
  context_type: ContextType,
) -> Result<Arc<dyn ExecutionContext>, ContextError> {
  debug!("making {:?} context '{}'", context_type, name);
  let context: Arc<dyn ExecutionContext> = match context_type {
    ContextType::Immediate => Arc::new(Immediate),
    ContextType::Worker => Arc::new(WorkerContextBuilder::named(name).build()?),
    ContextType::Runtime => Arc::new(Runtime),
  };
  Ok(context)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::utils::testing::async_context;

  use std::sync::mpsc::channel;

  fn thread_name() -> Option<String> {
    std::thread::current().name().map(str::to_owned)
  }

  #[test]
  fn immediate_runs_inline_test() {
    let caller = std::thread::current().id();
    let (tx, rx) = channel();
    Immediate.run(Box::new(move || {
      tx.send(std::thread::current().id()).unwrap();
    }));
    assert_eq!(rx.try_recv().unwrap(), caller);
  }

  #[test]
  fn worker_context_thread_test() {
    async_context(|| {
      let context = WorkerContextBuilder::named("zone").build().unwrap();
      let (tx, rx) = channel();
      context.run(Box::new(move || tx.send(thread_name()).unwrap()));
      assert_eq!(rx.recv().unwrap().as_deref(), Some("zone"));
      assert_eq!(context.name(), "zone");
    });
  }

  #[test]
  fn worker_context_default_name_test() {
    let a = WorkerContextBuilder::new();
    let b = WorkerContextBuilder::new();
    assert!(a.name.starts_with("context"));
    assert_ne!(a.name, b.name);
  }

  #[test]
  fn worker_context_stack_size_test() {
    async_context(|| {
      let builder = WorkerContextBuilder::named("deep").stack_size(8 << 20);
      assert_eq!(builder.stack_size, Some(8 << 20));
      let context = builder.build().unwrap();
      let (tx, rx) = channel();
      // Larger than the default thread stack
      context.run(Box::new(move || {
        let buffer = [1u8; 4 << 20];
        tx.send(buffer.iter().map(|x| *x as usize).sum::<usize>()).unwrap();
      }));
      assert_eq!(rx.recv().unwrap(), 4 << 20);
    });
  }

  #[test]
  fn runtime_context_test() {
    async_context(|| {
      let (tx, rx) = channel();
      Runtime.run(Box::new(move || tx.send(thread_name()).unwrap()));
      assert_eq!(rx.recv().unwrap().as_deref(), Some("runtime"));
    });
  }

  #[test]
  fn make_context_test() {
    async_context(|| {
      let (tx, rx) = channel();
      let worker = make_context("made".to_owned(), ContextType::Worker).unwrap();
      worker.run(Box::new(move || tx.send(thread_name()).unwrap()));
      assert_eq!(rx.recv().unwrap().as_deref(), Some("made"));

      let (tx, rx) = channel();
      let immediate = make_context("unused".to_owned(), ContextType::Immediate).unwrap();
      immediate.run(Box::new(move || tx.send(()).unwrap()));
      assert!(rx.try_recv().is_ok());
    });
  }
}
