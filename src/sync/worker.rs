use crate::error::ContextError;

use log::{debug, error};

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub type Job = Box<dyn FnOnce() + Send>;

/// Marks the worker unhealthy when its thread unwinds out of a job, jobs
/// still queued at that point are discarded
struct HealthUnwinder {
  name: String,
  flag: Arc<AtomicBool>,
  queued: Arc<AtomicIsize>,
}

impl Drop for HealthUnwinder {
  fn drop(&mut self) {
    if std::thread::panicking() {
      error!("worker '{}' panicked, refusing further jobs", self.name);
      self.flag.store(false, Ordering::Release);
      self.queued.store(0, Ordering::Release);
    }
  }
}

enum WorkerSignal {
  Run(Job),
  Close,
}

struct WorkerInner {
  name: String,
  sender: Mutex<Sender<WorkerSignal>>,
  queued: Arc<AtomicIsize>,
  healthy: Arc<AtomicBool>,
}

impl Drop for WorkerInner {
  fn drop(&mut self) {
    if let Ok(guard) = self.sender.lock() {
      let _ = guard.send(WorkerSignal::Close);
    }
  }
}

/// A dedicated thread running submitted jobs one at a time, in submission
/// order
///
/// Cloned handles share the same thread. Once the last handle is dropped the
/// worker finishes the jobs queued so far and quits.
#[derive(Clone)]
pub struct Worker {
  inner: Arc<WorkerInner>,
}

impl Worker {
  pub fn named(name: String) -> Result<Self, ContextError> {
    Self::spawn(name, None).map(|(worker, _)| worker)
  }

  pub(crate) fn spawn(
    name: String,
    stack_size: Option<usize>,
  ) -> Result<(Self, JoinHandle<()>), ContextError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let queued = Arc::new(AtomicIsize::new(0));
    let healthy = Arc::new(AtomicBool::new(true));
    let handle = Self::run(
      name.clone(),
      stack_size,
      rx,
      queued.clone(),
      healthy.clone(),
    )?;
    debug!("worker '{}' started", name);
    Ok((
      Worker {
        inner: Arc::new(WorkerInner {
          name,
          sender: Mutex::new(tx),
          queued,
          healthy,
        }),
      },
      handle,
    ))
  }

  fn run(
    name: String,
    stack_size: Option<usize>,
    receiver: Receiver<WorkerSignal>,
    queued: Arc<AtomicIsize>,
    healthy: Arc<AtomicBool>,
  ) -> Result<JoinHandle<()>, ContextError> {
    let mut builder = std::thread::Builder::new().name(name.clone());
    if let Some(size) = stack_size {
      builder = builder.stack_size(size);
    }
    let thread_name = name.clone();
    builder
      .spawn(move || {
        let _unwinder = HealthUnwinder {
          name: thread_name,
          flag: healthy,
          queued: queued.clone(),
        };
        while let Ok(WorkerSignal::Run(job)) = receiver.recv() {
          job();
          queued.fetch_sub(1, Ordering::AcqRel);
        }
      })
      .map_err(|error| ContextError::Spawn {
        name,
        reason: error.to_string(),
      })
  }

  /// Submits a job to be run on the worker thread
  ///
  /// # Example
  /// ```
  /// use tether::sync::worker::Worker;
  /// use std::sync::mpsc::channel;
  ///
  /// let worker = Worker::named("example".to_owned()).unwrap();
  /// let (tx, rx) = channel();
  /// worker
  ///   .submit(move || {
  ///     let name = std::thread::current().name().map(str::to_owned);
  ///     tx.send(name).unwrap();
  ///   })
  ///   .unwrap();
  /// assert_eq!(rx.recv().unwrap().as_deref(), Some("example"));
  /// ```
  pub fn submit<F>(&self, job: F) -> Result<(), ContextError>
  where
    F: FnOnce() + Send + 'static,
  {
    if !self.healthy() {
      return Err(ContextError::Unhealthy {
        name: self.inner.name.clone(),
      });
    }
    let guard = self
      .inner
      .sender
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    self.inner.queued.fetch_add(1, Ordering::AcqRel);
    // The receiver only goes away once the thread has unwound, every live
    // handle keeps the worker from closing.
    guard.send(WorkerSignal::Run(Box::new(job))).map_err(|_| {
      self.inner.queued.fetch_sub(1, Ordering::AcqRel);
      ContextError::Unhealthy {
        name: self.inner.name.clone(),
      }
    })
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  /// Returns true when no job is waiting to run, a worker which panicked
  /// never runs its queued jobs and is always idle
  pub fn idle(&self) -> bool {
    !self.healthy() || self.inner.queued.load(Ordering::Acquire) <= 0
  }

  pub fn healthy(&self) -> bool {
    self.inner.healthy.load(Ordering::Acquire)
  }
}
