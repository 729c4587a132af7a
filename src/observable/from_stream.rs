use std::{cell::RefCell, ops::ControlFlow, rc::Rc};

use futures::{
  future::FutureExt,
  stream::{LocalBoxStream, Stream, StreamExt},
};
use tracing::{debug, error};

use crate::{
  cancellation::CancellationToken,
  observable::Observable,
  scheduler::{LocalScheduler, Scheduler},
  subscriber::SubscriptionObserver,
};

/// Returns an `Observable` that emits all the items returned from the source
/// `Stream`, pulling it on the [`LocalScheduler`].
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let stream = futures::stream::iter(1..4);
/// let numbers: Observable<i32> = from_stream(stream);
/// numbers.subscribe_next(|x| println!("{x}"));
///
/// LocalScheduler::run();
///
/// // prints:
/// // 1
/// // 2
/// // 3
/// ```
///
/// A stream can only be consumed once: the first subscription drains it and
/// every later subscription completes immediately. Use [`from_stream_fn`] to
/// get a fresh stream per subscription.
///
/// If you want convert a `Stream` that can fail use
/// [`from_stream_result`](crate::observable::from_stream_result) instead.
pub fn from_stream<S, Err>(stream: S) -> Observable<S::Item, Err>
where
  S: Stream + 'static,
  S::Item: 'static,
  Err: 'static,
{
  from_stream_on(stream, LocalScheduler)
}

/// [`from_stream`] pulling on the given scheduler.
pub fn from_stream_on<S, Err, Sch>(stream: S, scheduler: Sch) -> Observable<S::Item, Err>
where
  S: Stream + 'static,
  S::Item: 'static,
  Err: 'static,
  Sch: Scheduler,
{
  let stream = RefCell::new(Some(stream.boxed_local()));
  pull_on(move || stream.borrow_mut().take(), scheduler, next_item)
}

/// Creates an observable that calls `factory` for a fresh stream on every
/// subscription.
pub fn from_stream_fn<F, S, Err>(factory: F) -> Observable<S::Item, Err>
where
  F: Fn() -> S + 'static,
  S: Stream + 'static,
  S::Item: 'static,
  Err: 'static,
{
  from_stream_fn_on(factory, LocalScheduler)
}

/// [`from_stream_fn`] pulling on the given scheduler.
pub fn from_stream_fn_on<F, S, Err, Sch>(factory: F, scheduler: Sch) -> Observable<S::Item, Err>
where
  F: Fn() -> S + 'static,
  S: Stream + 'static,
  S::Item: 'static,
  Err: 'static,
  Sch: Scheduler,
{
  pull_on(move || Some(factory().boxed_local()), scheduler, next_item)
}

fn next_item<Item, Err>(o: &SubscriptionObserver<Item, Err>, v: Item) -> ControlFlow<()> {
  o.next(v);
  ControlFlow::Continue(())
}

/// What to do with one pulled element.
pub(crate) type Deliver<Item, Err, Pulled> = fn(&SubscriptionObserver<Item, Err>, Pulled) -> ControlFlow<()>;

/// Spawn a pull loop per subscription. `streams` yields `None` once a one-shot
/// stream has been taken, which completes the subscription immediately.
///
/// The teardown is a cancellation token; every pull races against it, so a
/// pending pull is abandoned as soon as the subscription closes.
pub(crate) fn pull_on<Pulled, Item, Err, Sch>(
  streams: impl Fn() -> Option<LocalBoxStream<'static, Pulled>> + 'static,
  scheduler: Sch,
  deliver: Deliver<Item, Err, Pulled>,
) -> Observable<Item, Err>
where
  Pulled: 'static,
  Item: 'static,
  Err: 'static,
  Sch: Scheduler,
{
  let streams = Rc::new(streams);
  Observable::new(move |o: SubscriptionObserver<Item, Err>| {
    let token = CancellationToken::new();
    let Some(mut stream) = streams() else {
      o.complete();
      return token;
    };

    let c_token = token.clone();
    let unspawned = o.clone();
    let task = async move {
      while let Some(pulled) = c_token.run_until_cancelled(stream.next()).await {
        match pulled {
          Some(v) => {
            if deliver(&o, v).is_break() {
              return;
            }
          }
          None => {
            o.complete();
            return;
          }
        }
      }
      debug!("stream bridge cancelled, dropping the rest of the stream");
    };
    if let Err(err) = scheduler.schedule(task.boxed_local()) {
      error!(%err, "failed to spawn the stream bridge, completing instead");
      unspawned.complete();
    }
    token
  })
}
