use std::{
  fmt::{Debug, Formatter},
  rc::Rc,
};

use crate::cancellation::CancellationToken;

mod dynamic;
pub use dynamic::*;

/// Subscription returns from `Observable.subscribe(Observer)` to allow
/// unsubscribing.
pub trait SubscriptionLike {
  /// Stop receiving signals and release the producer's resources. Calling it
  /// more than once has no further effect.
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

/// Consumer-facing handle of one subscription.
///
/// Cloning shares the handle; any clone can unsubscribe. Holding it does not
/// keep a torn-down producer's resources alive.
#[derive(Clone)]
pub struct Subscription(Rc<dyn SubscriptionLike>);

struct Finished;

impl SubscriptionLike for Finished {
  fn unsubscribe(&self) {}

  fn is_closed(&self) -> bool { true }
}

impl Subscription {
  pub fn new(inner: impl SubscriptionLike + 'static) -> Self { Self(Rc::new(inner)) }

  /// A handle that is already closed.
  pub fn finished() -> Self { Self::new(Finished) }

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }
}

impl SubscriptionLike for Subscription {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Subscription);

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

/// What a subscriber function hands back to release its resources.
pub enum Teardown {
  Nil,
  Action(Box<dyn FnOnce()>),
  Subscription(Box<dyn SubscriptionLike>),
}

impl Teardown {
  pub fn action(f: impl FnOnce() + 'static) -> Self { Teardown::Action(Box::new(f)) }

  pub fn run(self) {
    match self {
      Teardown::Nil => {}
      Teardown::Action(f) => f(),
      Teardown::Subscription(s) => s.unsubscribe(),
    }
  }
}

impl Debug for Teardown {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Teardown::Nil => f.write_str("Teardown::Nil"),
      Teardown::Action(_) => f.write_str("Teardown::Action(..)"),
      Teardown::Subscription(s) => f
        .debug_struct("Teardown::Subscription")
        .field("is_closed", &s.is_closed())
        .finish(),
    }
  }
}

/// Everything a subscriber function may return.
///
/// `Err(e)` means the producer failed during setup; the kernel routes it to
/// the consumer's `error` handler.
pub trait IntoTeardown<Err> {
  fn into_teardown(self) -> Result<Teardown, Err>;
}

impl<Err> IntoTeardown<Err> for () {
  #[inline]
  fn into_teardown(self) -> Result<Teardown, Err> { Ok(Teardown::Nil) }
}

impl<Err> IntoTeardown<Err> for Teardown {
  #[inline]
  fn into_teardown(self) -> Result<Teardown, Err> { Ok(self) }
}

impl<Err> IntoTeardown<Err> for Subscription {
  #[inline]
  fn into_teardown(self) -> Result<Teardown, Err> { Ok(Teardown::Subscription(Box::new(self))) }
}

impl<Err> IntoTeardown<Err> for CancellationToken {
  #[inline]
  fn into_teardown(self) -> Result<Teardown, Err> { Ok(Teardown::Subscription(Box::new(self))) }
}

impl<Err, R: IntoTeardown<Err>> IntoTeardown<Err> for Result<R, Err> {
  #[inline]
  fn into_teardown(self) -> Result<Teardown, Err> { self.and_then(IntoTeardown::into_teardown) }
}

impl<Err, F: FnOnce() + 'static> IntoTeardown<Err> for F {
  #[inline]
  fn into_teardown(self) -> Result<Teardown, Err> { Ok(Teardown::action(self)) }
}
