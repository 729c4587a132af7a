use futures::future::{Future, FutureExt};
use tracing::{debug, error};

use super::{passthrough, Upstream};
use crate::{
  cancellation::CancellationToken,
  observable::Observable,
  scheduler::{LocalScheduler, Scheduler},
  subscriber::SubscriptionObserver,
};

/// Await every future the source emits and emit what it resolves to.
///
/// Resolutions are delivered as they happen, not in the order the futures
/// arrived. Completion of the source passes straight through; futures still
/// pending at that point are abandoned.
pub fn fulfill<F, T, E>() -> impl FnOnce(Observable<F, E>) -> Observable<T, E>
where
  F: Future<Output = Result<T, E>> + 'static,
  T: 'static,
  E: 'static,
{
  fulfill_on(LocalScheduler)
}

/// [`fulfill`] awaiting on the given scheduler.
pub fn fulfill_on<F, T, E, Sch>(scheduler: Sch) -> impl FnOnce(Observable<F, E>) -> Observable<T, E>
where
  F: Future<Output = Result<T, E>> + 'static,
  T: 'static,
  E: 'static,
  Sch: Scheduler,
{
  move |source: Observable<F, E>| {
    Observable::new(move |downstream: SubscriptionObserver<T, E>| {
      let token = CancellationToken::new();
      let upstream = Upstream::new();

      let (c_token, c_scheduler, c_downstream) = (token.clone(), scheduler.clone(), downstream.clone());
      let observer = passthrough(downstream).on_next(move |fut: F| {
        let o = c_downstream.clone();
        let resolution = c_token.run_until_cancelled(fut);
        let task = async move {
          match resolution.await {
            Some(Ok(v)) => o.next(v),
            Some(Err(e)) => {
              if !o.is_closed() && o.error(e).is_err() {
                error!("rejected future was not handled by the subscriber");
              }
            }
            None => debug!("pending future abandoned by teardown"),
          }
        };
        if let Err(err) = c_scheduler.schedule(task.boxed_local()) {
          error!(%err, "failed to spawn a future to fulfill, completing instead");
          c_downstream.complete();
        }
      });
      upstream.subscribe(&source, observer);

      move || {
        upstream.unsubscribe();
        token.cancel();
      }
    })
  }
}
