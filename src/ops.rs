//! Operators.
//!
//! A transform operator is a function returning `impl FnOnce(Observable<T, E>)
//! -> Observable<U, E>`, ready for [`Observable::pipe`] and [`pipe!`](crate::pipe).
//! A combinator builds one observable out of several.
//!
//! Every operator is a kernel around kernels: subscribing to the result
//! subscribes to the sources, and the result's teardown unsubscribes them.

use std::{cell::RefCell, rc::Rc};

use tracing::error;

use crate::{
  observable::Observable,
  observer::Observer,
  subscriber::SubscriptionObserver,
  subscription::{Subscription, SubscriptionLike},
};

mod combine;
mod concat;
mod filter;
mod flatten;
mod fulfill;
mod map;
mod merge;
mod observe;
mod race;
mod reduce;

pub use combine::*;
pub use concat::*;
pub use filter::*;
pub use flatten::*;
pub use fulfill::*;
pub use map::*;
pub use merge::*;
pub use observe::*;
pub use race::*;
pub use reduce::*;

/// The upstream subscription, captured in `start` so a synchronous source can
/// be stopped before its `subscribe` call has returned.
pub(crate) struct Upstream(Rc<RefCell<Option<Subscription>>>);

impl Clone for Upstream {
  fn clone(&self) -> Self { Upstream(self.0.clone()) }
}

impl Upstream {
  pub(crate) fn new() -> Self { Upstream(Rc::default()) }

  pub(crate) fn subscribe<T: 'static, E: 'static>(
    &self,
    source: &Observable<T, E>,
    observer: Observer<T, E>,
  ) -> Subscription {
    let slot = self.0.clone();
    source.subscribe(observer.on_start(move |s| *slot.borrow_mut() = Some(s.clone())))
  }

  pub(crate) fn unsubscribe(&self) {
    let upstream = self.0.borrow_mut().take();
    if let Some(upstream) = upstream {
      upstream.unsubscribe();
    }
  }
}

/// Subscribe `source` on behalf of `downstream`: errors and completion pass
/// through, values go to `next`. The upstream closes as soon as the
/// downstream does.
pub(crate) fn forward<T, U, E>(
  source: &Observable<T, E>,
  downstream: SubscriptionObserver<U, E>,
  mut next: impl FnMut(&SubscriptionObserver<U, E>, T) + 'static,
) -> Subscription
where
  T: 'static,
  U: 'static,
  E: 'static,
{
  let upstream = Upstream::new();
  let c_upstream = upstream.clone();
  let c_downstream = downstream.clone();
  let observer = passthrough(downstream).on_next(move |v| {
    next(&c_downstream, v);
    if c_downstream.is_closed() {
      c_upstream.unsubscribe();
    }
  });
  upstream.subscribe(source, observer)
}

/// An observer with no `next` handler that hands errors and completion on
/// to `downstream`.
pub(crate) fn passthrough<T, U, E>(downstream: SubscriptionObserver<U, E>) -> Observer<T, E>
where
  U: 'static,
  E: 'static,
{
  let error = downstream.clone();
  Observer::new()
    .on_error_forward(move |e| error.error(e))
    .on_complete(move || downstream.complete())
}

/// Send an error raised by an operator downstream.
///
/// # Panics
///
/// When the downstream has no error handler: an error nobody handles
/// resurfaces where it was raised.
pub(crate) fn raise<U, E>(downstream: &SubscriptionObserver<U, E>, err: E) {
  if downstream.is_closed() {
    return;
  }
  if downstream.error(err).is_err() {
    error!("error raised by an operator was not handled");
    panic!("unhandled error raised by an operator");
  }
}
