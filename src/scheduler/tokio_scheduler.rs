use futures::future::LocalBoxFuture;

use super::Scheduler;
use crate::error::RxError;

/// Spawns onto the tokio `LocalSet` the caller is running inside.
///
/// `tokio::task::spawn_local` panics outside a `LocalSet`, so every bridge
/// using this scheduler must be subscribed from within one.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioLocalScheduler;

impl Scheduler for TokioLocalScheduler {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), RxError> {
    let _handle = tokio::task::spawn_local(task);
    Ok(())
  }
}
