//! Where asynchronous bridges run their tasks.
//!
//! Every suspension point in rxlite lives inside a task handed to a
//! [`Scheduler`]. The default [`LocalScheduler`] is a thread-local
//! `futures::executor::LocalPool` that the host drives explicitly.

use std::{cell::RefCell, future::Future};

use futures::{
  executor::{LocalPool, LocalSpawner},
  future::{FutureExt, LocalBoxFuture, LocalFutureObj},
  task::LocalSpawn,
};
use tracing::error;

use crate::error::RxError;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioLocalScheduler;

/// A Scheduler accepts `'static` local tasks and runs them on the current
/// thread at some later point.
pub trait Scheduler: Clone + 'static {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RxError>;
}

thread_local! {
  static POOL: RefCell<LocalPool> = RefCell::new(LocalPool::new());
  static SPAWNER: LocalSpawner = POOL.with(|pool| pool.borrow().spawner());
}

/// Handle to the thread-local task pool.
///
/// Tasks spawned here only run while the host drives the pool with
/// [`LocalScheduler::run_until_stalled`], [`LocalScheduler::run`] or
/// [`LocalScheduler::block_on`]. Driving the pool from inside one of its own
/// tasks panics.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalScheduler;

impl LocalScheduler {
  /// The spawner feeding the thread-local pool.
  pub fn spawner() -> LocalSpawner { SPAWNER.with(|s| s.clone()) }

  /// Spawn a task whose failure to start is only worth a log line.
  pub fn spawn_detached(task: impl Future<Output = ()> + 'static) {
    if let Err(err) = LocalScheduler.schedule(task.boxed_local()) {
      error!(%err, "dropping detached task");
    }
  }

  /// Run every task that can make progress without waiting on outside events.
  pub fn run_until_stalled() { Self::with_pool(|pool| pool.run_until_stalled()) }

  /// Run until every spawned task has finished.
  pub fn run() { Self::with_pool(|pool| pool.run()) }

  /// Drive `fut` to completion, running spawned tasks alongside it.
  pub fn block_on<F: Future>(fut: F) -> F::Output { Self::with_pool(|pool| pool.run_until(fut)) }

  fn with_pool<R>(f: impl FnOnce(&mut LocalPool) -> R) -> R {
    POOL.with(|pool| {
      let mut pool = pool
        .try_borrow_mut()
        .unwrap_or_else(|_| panic!("the LocalScheduler pool is already being driven on this thread"));
      f(&mut pool)
    })
  }
}

impl Scheduler for LocalScheduler {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RxError> {
    SPAWNER.with(|spawner| spawner.schedule(task))
  }
}

impl Scheduler for LocalSpawner {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RxError> {
    self.spawn_local_obj(LocalFutureObj::from(task))?;
    Ok(())
  }
}
