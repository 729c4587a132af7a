use futures::future::{Future, FutureExt};
use tracing::{debug, error};

use crate::{
  cancellation::CancellationToken,
  observable::Observable,
  scheduler::{LocalScheduler, Scheduler},
};

/// Converts a `Future` resolving to a `Result` into a single-value observable.
///
/// `Ok(v)` emits `v` and completes; `Err(e)` is routed to the error handler.
/// The future is shared: it runs once, and every subscription, early or late,
/// observes the same resolution.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let answer: Observable<i32, String> = from_future(async { Ok(42) });
/// answer.subscribe_next(|v| assert_eq!(v, 42));
/// LocalScheduler::run();
/// ```
pub fn from_future<F, T, E>(future: F) -> Observable<T, E>
where
  F: Future<Output = Result<T, E>> + 'static,
  T: Clone + 'static,
  E: Clone + 'static,
{
  from_future_on(future, LocalScheduler)
}

/// [`from_future`] awaiting on the given scheduler.
pub fn from_future_on<F, T, E, Sch>(future: F, scheduler: Sch) -> Observable<T, E>
where
  F: Future<Output = Result<T, E>> + 'static,
  T: Clone + 'static,
  E: Clone + 'static,
  Sch: Scheduler,
{
  let shared = future.boxed_local().shared();
  Observable::new(move |o| {
    let token = CancellationToken::new();
    let resolution = token.run_until_cancelled(shared.clone());
    let unspawned = o.clone();
    let task = async move {
      match resolution.await {
        Some(Ok(v)) => {
          o.next(v);
          o.complete();
        }
        Some(Err(e)) => {
          if !o.is_closed() && o.error(e).is_err() {
            error!("future rejection was not handled by the subscriber");
          }
        }
        None => debug!("future bridge cancelled before the future resolved"),
      }
    };
    if let Err(err) = scheduler.schedule(task.boxed_local()) {
      error!(%err, "failed to spawn the future bridge, completing instead");
      unspawned.complete();
    }
    token
  })
}
