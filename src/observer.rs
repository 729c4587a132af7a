//! The consumer record.
//!
//! An [`Observer`] is an immutable bundle of optional handlers. The kernel
//! takes it apart once at subscribe time, so a handler is resolved exactly
//! once per subscription.

use std::{
  convert::Infallible,
  fmt::{Debug, Formatter},
};

use crate::subscription::Subscription;

pub(crate) type StartFn = Box<dyn FnOnce(&Subscription)>;
pub(crate) type NextFn<Item> = Box<dyn FnMut(Item)>;
/// `Err` hands the error back: nobody handled it.
pub(crate) type ErrorFn<Err> = Box<dyn FnOnce(Err) -> Result<(), Err>>;
pub(crate) type CompleteFn = Box<dyn FnOnce()>;

/// Handlers for the signals of one subscription. Every handler is optional.
///
/// Besides the builder, closures and tuples convert into an observer:
/// - `|v| ..` is `{ next }`
/// - `(|v| .., |e| ..)` is `{ next, error }`
/// - `(|v| .., |e| .., || ..)` is `{ next, error, complete }`
pub struct Observer<Item, Err = Infallible> {
  pub(crate) start: Option<StartFn>,
  pub(crate) next: Option<NextFn<Item>>,
  pub(crate) error: Option<ErrorFn<Err>>,
  pub(crate) complete: Option<CompleteFn>,
}

impl<Item, Err> Default for Observer<Item, Err> {
  fn default() -> Self { Observer { start: None, next: None, error: None, complete: None } }
}

impl<Item, Err> Observer<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Called with the subscription handle before the producer starts.
  /// Unsubscribing here means the producer never runs.
  pub fn on_start(mut self, f: impl FnOnce(&Subscription) + 'static) -> Self {
    self.start = Some(Box::new(f));
    self
  }

  pub fn on_next(mut self, f: impl FnMut(Item) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(Err) + 'static) -> Self {
    self.error = Some(Box::new(move |err| {
      f(err);
      Ok(())
    }));
    self
  }

  pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }

  /// An error handler that may decline the error, used by forwarding
  /// observers whose own target has no error handler.
  pub(crate) fn on_error_forward(mut self, f: impl FnOnce(Err) -> Result<(), Err> + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn has_error_handler(&self) -> bool { self.error.is_some() }
}

impl<Item, Err> Debug for Observer<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observer")
      .field("start", &self.start.is_some())
      .field("next", &self.next.is_some())
      .field("error", &self.error.is_some())
      .field("complete", &self.complete.is_some())
      .finish()
  }
}

impl<Item, Err, F> From<F> for Observer<Item, Err>
where
  F: FnMut(Item) + 'static,
{
  fn from(next: F) -> Self { Observer::new().on_next(next) }
}

impl<Item, Err, N, E> From<(N, E)> for Observer<Item, Err>
where
  N: FnMut(Item) + 'static,
  E: FnOnce(Err) + 'static,
{
  fn from((next, error): (N, E)) -> Self { Observer::new().on_next(next).on_error(error) }
}

impl<Item, Err, N, E, C> From<(N, E, C)> for Observer<Item, Err>
where
  N: FnMut(Item) + 'static,
  E: FnOnce(Err) + 'static,
  C: FnOnce() + 'static,
{
  fn from((next, error, complete): (N, E, C)) -> Self {
    Observer::new()
      .on_next(next)
      .on_error(error)
      .on_complete(complete)
  }
}
