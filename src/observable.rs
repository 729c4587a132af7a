//! The `Observable` primitive.
//!
//! An [`Observable`] is a cheap, cloneable handle to a subscriber function.
//! It is cold: nothing runs until `subscribe`, and every `subscribe` runs the
//! subscriber function once, against a fresh kernel.

use std::{
  cell::RefCell,
  convert::Infallible,
  fmt::{Debug, Formatter},
  future::Future,
  rc::Rc,
};

use futures::channel::oneshot;

use crate::{
  error::TerminalError,
  observer::Observer,
  ops,
  subscriber::{subscribe_with, SubscriptionObserver},
  subscription::{IntoTeardown, Subscription, SubscriptionGuard, Teardown},
};

mod from;
mod from_future;
mod from_iter;
mod from_stream;
mod from_stream_result;
mod of;
mod trivial;

pub use from::*;
pub use from_future::*;
pub use from_iter::*;
pub use from_stream::*;
pub use from_stream_result::*;
pub use of::*;
pub use trivial::*;

type SubscriberFn<Item, Err> = dyn Fn(SubscriptionObserver<Item, Err>) -> Result<Teardown, Err>;

/// A representation of any set of values over any amount of time. This is the
/// most basic building block of rxlite.
pub struct Observable<Item, Err = Infallible> {
  subscriber: Rc<SubscriberFn<Item, Err>>,
}

impl<Item, Err> Clone for Observable<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Observable { subscriber: self.subscriber.clone() } }
}

impl<Item, Err> Debug for Observable<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("Observable(..)") }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> {
  /// param `subscriber`: the function that is called each time the Observable
  /// is subscribed to. It is given a [`SubscriptionObserver`], to which new
  /// values can be `next`ed, or an `error` method can be called to raise an
  /// error, or `complete` can be called to notify of a successful completion.
  ///
  /// Whatever it returns is the teardown of that subscription: nothing, a
  /// closure, another [`Subscription`], or `Err(e)` if setup failed.
  pub fn new<F, R>(subscriber: F) -> Self
  where
    F: Fn(SubscriptionObserver<Item, Err>) -> R + 'static,
    R: IntoTeardown<Err>,
  {
    Observable { subscriber: Rc::new(move |observer| subscriber(observer).into_teardown()) }
  }

  pub fn subscribe<O: Into<Observer<Item, Err>>>(&self, observer: O) -> Subscription {
    subscribe_with(&*self.subscriber, observer.into())
  }

  pub fn subscribe_next(&self, next: impl FnMut(Item) + 'static) -> Subscription {
    self.subscribe(Observer::new().on_next(next))
  }

  pub fn subscribe_all(
    &self,
    next: impl FnMut(Item) + 'static,
    error: impl FnOnce(Err) + 'static,
    complete: impl FnOnce() + 'static,
  ) -> Subscription {
    self.subscribe(
      Observer::new()
        .on_next(next)
        .on_error(error)
        .on_complete(complete),
    )
  }

  /// Apply an operator. Compose several with [`pipe!`](crate::pipe).
  #[inline]
  pub fn pipe<U, E2>(self, op: impl FnOnce(Self) -> Observable<U, E2>) -> Observable<U, E2> { op(self) }

  pub fn map<U: 'static>(self, f: impl Fn(Item) -> U + 'static) -> Observable<U, Err> {
    self.pipe(ops::map(f))
  }

  pub fn try_map<U: 'static>(self, f: impl Fn(Item) -> Result<U, Err> + 'static) -> Observable<U, Err> {
    self.pipe(ops::try_map(f))
  }

  pub fn filter(self, pred: impl Fn(&Item) -> bool + 'static) -> Self { self.pipe(ops::filter(pred)) }

  pub fn reduce<U: 'static>(self, f: impl Fn(Option<U>, Item) -> U + 'static) -> Observable<Option<U>, Err> {
    self.pipe(ops::reduce(f))
  }

  pub fn try_reduce<U: 'static>(
    self,
    f: impl Fn(Option<U>, Item) -> Result<U, Err> + 'static,
  ) -> Observable<Option<U>, Err> {
    self.pipe(ops::try_reduce(f))
  }

  pub fn flat_map<I>(self, f: impl Fn(Item) -> I + 'static) -> Observable<I::Item, Err>
  where
    I: IntoIterator,
    I::Item: 'static,
  {
    self.pipe(ops::flat_map(f))
  }

  pub fn flatten(self) -> Observable<Item::Item, Err>
  where
    Item: IntoIterator,
    Item::Item: 'static,
  {
    self.pipe(ops::flatten())
  }

  pub fn fulfill<T: 'static>(self) -> Observable<T, Err>
  where
    Item: Future<Output = Result<T, Err>>,
  {
    self.pipe(ops::fulfill())
  }

  pub fn concat_with(self, other: Self) -> Self { ops::concat([self, other]) }

  pub fn merge_with(self, other: Self) -> Self { ops::merge([self, other]) }

  /// Subscribe now and resolve once the stream terminates.
  ///
  /// Dropping the future unsubscribes.
  pub fn for_each(
    &self,
    next: impl FnMut(Item) + 'static,
  ) -> impl Future<Output = Result<(), TerminalError<Err>>> {
    let (tx, rx) = oneshot::channel();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let tx_err = tx.clone();
    let subscription = self.subscribe(
      Observer::new()
        .on_next(next)
        .on_error(move |e| settle(&tx_err, Err(TerminalError::Error(e))))
        .on_complete(move || settle(&tx, Ok(()))),
    );
    settled(subscription.unsubscribe_when_dropped(), rx)
  }

  /// Subscribe now and resolve with the last value once the stream completes,
  /// or `None` if it completed without a value.
  ///
  /// Dropping the future unsubscribes.
  pub fn to_future(&self) -> impl Future<Output = Result<Option<Item>, TerminalError<Err>>> {
    let (tx, rx) = oneshot::channel();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let tx_err = tx.clone();
    let last = Rc::new(RefCell::new(None));
    let c_last = last.clone();
    let subscription = self.subscribe(
      Observer::new()
        .on_next(move |v| *c_last.borrow_mut() = Some(v))
        .on_error(move |e| settle(&tx_err, Err(TerminalError::Error(e))))
        .on_complete(move || settle(&tx, Ok(last.borrow_mut().take()))),
    );
    settled(subscription.unsubscribe_when_dropped(), rx)
  }
}

impl<T: 'static, Err: 'static> Observable<Observable<T, Err>, Err> {
  /// Flatten a stream of streams by subscribing to every inner stream as it
  /// arrives.
  pub fn observe(self) -> Observable<T, Err> { self.pipe(ops::observe()) }
}

type Settle<T> = Rc<RefCell<Option<oneshot::Sender<T>>>>;

fn settle<T>(tx: &Settle<T>, value: T) {
  if let Some(tx) = tx.borrow_mut().take() {
    let _ = tx.send(value);
  }
}

/// A torn-down subscription drops its handlers and with them the sender, which
/// is what turns into `TerminalError::Cancelled`.
///
/// The guard is taken before the future exists, so dropping it unpolled still
/// unsubscribes.
fn settled<T, E>(
  guard: SubscriptionGuard,
  rx: oneshot::Receiver<Result<T, TerminalError<E>>>,
) -> impl Future<Output = Result<T, TerminalError<E>>> {
  async move {
    let _guard = guard;
    rx.await.unwrap_or(Err(TerminalError::Cancelled))
  }
}

/// Anything that can be subscribed to with a [`SubscriptionObserver`].
///
/// This is the seam for foreign producers: `from` wraps a `Subscribable`
/// into an [`Observable`] directly.
pub trait Subscribable<Item, Err> {
  fn subscribe(&self, observer: SubscriptionObserver<Item, Err>) -> Subscription;
}

impl<Item: 'static, Err: 'static> Subscribable<Item, Err> for Observable<Item, Err> {
  fn subscribe(&self, observer: SubscriptionObserver<Item, Err>) -> Subscription {
    Observable::subscribe(self, observer)
  }
}

/// What an [`ObservableProvider`] hands out.
pub enum Interop<Item, Err> {
  Observable(Observable<Item, Err>),
  /// Called once more to get the observable.
  Factory(Box<dyn FnOnce() -> Observable<Item, Err>>),
  Foreign(Rc<dyn Subscribable<Item, Err>>),
}

/// Types that can hand out an observable view of themselves.
pub trait ObservableProvider<Item, Err> {
  fn observable(&self) -> Interop<Item, Err>;
}

impl<Item, Err> ObservableProvider<Item, Err> for Observable<Item, Err> {
  fn observable(&self) -> Interop<Item, Err> { Interop::Observable(self.clone()) }
}

/// Compose operators left to right into one operator.
///
/// `pipe!()` is the identity operator.
///
/// ```
/// use rxlite::prelude::*;
///
/// let source: Observable<i32> = of([1, 2, 3, 4]);
/// source
///   .pipe(pipe!(ops::map(|v: i32| v * 10), ops::filter(|v: &i32| *v > 15)))
///   .subscribe_next(|v| println!("{v}"));
/// ```
#[macro_export]
macro_rules! pipe {
  () => {
    |source| source
  };
  ($first:expr $(, $rest:expr)* $(,)?) => {{
    let op = $first;
    $(let op = $crate::observable::compose(op, $rest);)*
    op
  }};
}

#[doc(hidden)]
pub fn compose<A, B, C>(first: impl FnOnce(A) -> B, second: impl FnOnce(B) -> C) -> impl FnOnce(A) -> C {
  move |a| second(first(a))
}
