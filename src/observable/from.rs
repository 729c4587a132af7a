//! Adapting foreign shapes into an [`Observable`].

use std::rc::Rc;

use futures::stream::{LocalBoxStream, Stream, StreamExt};

use super::{from_stream_fn, Interop, Observable, ObservableProvider, Subscribable};
use crate::error::RxError;

/// Produces a fresh stream per subscription.
pub type StreamFactory<Item> = Rc<dyn Fn() -> LocalBoxStream<'static, Item>>;

/// Produces a fresh iterator per subscription.
pub type SequenceFactory<Item> = Rc<dyn Fn() -> Box<dyn Iterator<Item = Item>>>;

/// Capabilities [`from`] knows how to adapt.
///
/// Every probe defaults to `None`; implementors override the ones they
/// support. [`from`] asks them in declaration order and uses the first hit.
pub trait ObservableLike<Item, Err> {
  /// Already an [`Observable`]; used as-is.
  fn as_observable(&self) -> Option<Observable<Item, Err>> { None }

  /// Can be subscribed to directly.
  fn subscribable(&self) -> Option<Rc<dyn Subscribable<Item, Err>>> { None }

  /// Hands out an observable view through [`ObservableProvider`].
  fn interop(&self) -> Option<Interop<Item, Err>> { None }

  /// Can be pulled asynchronously.
  fn async_sequence(&self) -> Option<StreamFactory<Item>> { None }

  /// Can be iterated.
  fn sequence(&self) -> Option<SequenceFactory<Item>> { None }
}

/// Convert anything [`ObservableLike`] into an [`Observable`].
///
/// # Errors
///
/// [`RxError::NotObservable`] if `source` exposes none of the capabilities.
///
/// ```
/// use rxlite::prelude::*;
///
/// let numbers: Observable<i32> = from(vec![1, 2, 3]).unwrap();
/// numbers.subscribe_next(|v| println!("{v}"));
/// ```
pub fn from<Item, Err>(source: impl ObservableLike<Item, Err>) -> Result<Observable<Item, Err>, RxError>
where
  Item: 'static,
  Err: 'static,
{
  if let Some(observable) = source.as_observable() {
    return Ok(observable);
  }
  if let Some(subscribable) = source.subscribable() {
    return Ok(Observable::new(move |o| subscribable.subscribe(o)));
  }
  if let Some(interop) = source.interop() {
    return Ok(match interop {
      Interop::Observable(observable) => observable,
      Interop::Factory(factory) => factory(),
      Interop::Foreign(foreign) => Observable::new(move |o| foreign.subscribe(o)),
    });
  }
  if let Some(streams) = source.async_sequence() {
    return Ok(from_stream_fn(move || streams()));
  }
  if let Some(iters) = source.sequence() {
    return Ok(Observable::new(move |o| {
      for v in iters() {
        if o.is_closed() {
          return;
        }
        o.next(v);
      }
      o.complete();
    }));
  }
  Err(RxError::NotObservable)
}

impl<Item, Err> ObservableLike<Item, Err> for Observable<Item, Err> {
  fn as_observable(&self) -> Option<Observable<Item, Err>> { Some(self.clone()) }
}

impl<Item: Clone + 'static, Err> ObservableLike<Item, Err> for Vec<Item> {
  fn sequence(&self) -> Option<SequenceFactory<Item>> {
    let items = self.clone();
    Some(Rc::new(move || Box::new(items.clone().into_iter())))
  }
}

/// Any re-iterable collection, for [`from`].
#[derive(Clone, Debug)]
pub struct Sequence<I>(pub I);

impl<I, Err> ObservableLike<I::Item, Err> for Sequence<I>
where
  I: IntoIterator + Clone + 'static,
  I::IntoIter: 'static,
{
  fn sequence(&self) -> Option<SequenceFactory<I::Item>> {
    let items = self.0.clone();
    Some(Rc::new(move || Box::new(items.clone().into_iter())))
  }
}

/// A stream factory, for [`from`]. Each subscription pulls a fresh stream.
pub struct AsyncSequence<F>(Rc<F>);

impl<F> AsyncSequence<F> {
  pub fn new(factory: F) -> Self { AsyncSequence(Rc::new(factory)) }
}

impl<F, S, Err> ObservableLike<S::Item, Err> for AsyncSequence<F>
where
  F: Fn() -> S + 'static,
  S: Stream + 'static,
{
  fn async_sequence(&self) -> Option<StreamFactory<S::Item>> {
    let factory = self.0.clone();
    Some(Rc::new(move || factory().boxed_local()))
  }
}

/// An [`ObservableProvider`], for [`from`].
pub struct Provided<P>(pub P);

impl<P, Item, Err> ObservableLike<Item, Err> for Provided<P>
where
  P: ObservableProvider<Item, Err>,
{
  fn interop(&self) -> Option<Interop<Item, Err>> { Some(self.0.observable()) }
}
