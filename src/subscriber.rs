//! The subscription kernel.
//!
//! Every `subscribe` call creates one kernel: a small state machine that owns
//! the consumer's handlers and the producer's cleanup. The producer drives it
//! through a [`SubscriptionObserver`]; the consumer holds a [`Subscription`]
//! to the same kernel.
//!
//! Guarantees:
//! - at most one terminal signal reaches the consumer, and nothing after it;
//! - cleanup runs at most once, and always after a terminal signal or an
//!   unsubscribe, even while a handler panic unwinds;
//! - once closed, the kernel drops the consumer's handlers.

use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter},
  panic::{catch_unwind, AssertUnwindSafe},
  rc::Rc,
  thread,
};

use tracing::{debug, error, trace};

use crate::{
  observer::{CompleteFn, ErrorFn, NextFn, Observer},
  subscription::{Subscription, SubscriptionLike, Teardown},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KernelState {
  Open,
  Closed,
}

struct Kernel<Item, Err> {
  state: Cell<KernelState>,
  cleanup: RefCell<Option<Teardown>>,
  next: RefCell<Option<NextFn<Item>>>,
  error: RefCell<Option<ErrorFn<Err>>>,
  complete: RefCell<Option<CompleteFn>>,
}

impl<Item, Err> Kernel<Item, Err> {
  fn new(next: Option<NextFn<Item>>, error: Option<ErrorFn<Err>>, complete: Option<CompleteFn>) -> Self {
    Kernel {
      state: Cell::new(KernelState::Open),
      cleanup: RefCell::new(None),
      next: RefCell::new(next),
      error: RefCell::new(error),
      complete: RefCell::new(complete),
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.state.get() == KernelState::Closed }

  /// Open -> Closed. Only the call that performed the transition sees `true`.
  #[inline]
  fn close(&self) -> bool { self.state.replace(KernelState::Closed) == KernelState::Open }

  /// Drop every handler that is not currently running.
  fn release_handlers(&self) {
    let next = self.next.try_borrow_mut().ok().and_then(|mut h| h.take());
    let error = self.error.try_borrow_mut().ok().and_then(|mut h| h.take());
    let complete = self.complete.try_borrow_mut().ok().and_then(|mut h| h.take());
    drop((next, error, complete));
  }

  fn install(&self, teardown: Teardown) {
    if self.is_closed() {
      trace!("subscription closed during setup, tearing down immediately");
      teardown.run();
    } else {
      *self.cleanup.borrow_mut() = Some(teardown);
    }
  }

  /// The slot is emptied before the teardown runs, so a teardown that
  /// re-enters the kernel finds nothing left to run.
  fn run_cleanup(&self) {
    let teardown = self.cleanup.borrow_mut().take();
    if let Some(teardown) = teardown {
      trace!(?teardown, "running subscription teardown");
      teardown.run();
    }
  }

  fn unsubscribe(&self) {
    if self.close() {
      self.release_handlers();
      self.run_cleanup();
    }
  }
}

/// Runs the cleanup when dropped. While unwinding, a panicking cleanup is
/// swallowed so the original panic keeps going.
struct CleanupOnDrop<'a, Item, Err>(&'a Kernel<Item, Err>);

impl<Item, Err> Drop for CleanupOnDrop<'_, Item, Err> {
  fn drop(&mut self) {
    if thread::panicking() {
      let _ = catch_unwind(AssertUnwindSafe(|| self.0.run_cleanup()));
    } else {
      self.0.run_cleanup();
    }
  }
}

/// Closes the kernel if the `next` handler unwinds.
struct CloseOnUnwind<'a, Item, Err>(&'a Kernel<Item, Err>);

impl<Item, Err> CloseOnUnwind<'_, Item, Err> {
  fn disarm(self) { std::mem::forget(self) }
}

impl<Item, Err> Drop for CloseOnUnwind<'_, Item, Err> {
  fn drop(&mut self) {
    self.0.close();
    self.0.release_handlers();
    let _ = catch_unwind(AssertUnwindSafe(|| self.0.run_cleanup()));
  }
}

/// Producer-facing handle of one subscription.
///
/// Cloning shares the same kernel. Signals sent after the subscription closed
/// never reach the consumer.
pub struct SubscriptionObserver<Item, Err>(Rc<Kernel<Item, Err>>);

impl<Item, Err> Clone for SubscriptionObserver<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> SubscriptionObserver<Item, Err> {
  /// Deliver a value. A no-op once the subscription is closed.
  ///
  /// # Panics
  ///
  /// If called from inside this same subscription's `next` handler, or if the
  /// handler itself panics. In the latter case the subscription is closed and
  /// its cleanup has run before the panic leaves this call.
  pub fn next(&self, value: Item) {
    if self.0.is_closed() {
      debug!("dropping a value delivered after the subscription closed");
      return;
    }
    let armed = CloseOnUnwind(&self.0);
    {
      let mut slot = match self.0.next.try_borrow_mut() {
        Ok(slot) => slot,
        Err(_) => panic!(
          "re-entrant `next`: a `next` handler delivered into its own subscription. Emit \
           recursively through a Subject or defer the value to a scheduler instead."
        ),
      };
      if let Some(handler) = slot.as_mut() {
        handler(value);
      }
    }
    armed.disarm();

    if self.0.is_closed() {
      self.0.release_handlers();
    }
  }

  /// Deliver an error and close the subscription.
  ///
  /// Returns the error back when nobody took it: the subscription was already
  /// closed, or the consumer has no error handler.
  pub fn error(&self, err: Err) -> Result<(), Err> {
    if !self.0.close() {
      debug!("error signalled on a closed subscription, returning it to the producer");
      return Err(err);
    }
    let handler = self.0.error.try_borrow_mut().ok().and_then(|mut h| h.take());
    self.0.release_handlers();

    let _cleanup = CleanupOnDrop(&self.0);
    match handler {
      Some(handler) => handler(err),
      None => Err(err),
    }
  }

  /// Signal completion and close the subscription. A no-op once closed.
  pub fn complete(&self) {
    if !self.0.close() {
      return;
    }
    let handler = self.0.complete.try_borrow_mut().ok().and_then(|mut h| h.take());
    self.0.release_handlers();

    let _cleanup = CleanupOnDrop(&self.0);
    if let Some(handler) = handler {
      handler();
    }
  }

  /// Live view of the subscription state.
  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<Item, Err> Debug for SubscriptionObserver<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionObserver")
      .field("state", &self.0.state.get())
      .finish()
  }
}

impl<Item: 'static, Err: 'static> From<SubscriptionObserver<Item, Err>> for Observer<Item, Err> {
  fn from(downstream: SubscriptionObserver<Item, Err>) -> Self {
    let (next, error) = (downstream.clone(), downstream.clone());
    Observer::new()
      .on_next(move |v| next.next(v))
      .on_error_forward(move |e| error.error(e))
      .on_complete(move || downstream.complete())
  }
}

struct KernelSubscription<Item, Err>(Rc<Kernel<Item, Err>>);

impl<Item, Err> SubscriptionLike for KernelSubscription<Item, Err> {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// Run one subscription: create the kernel, call `start`, invoke the
/// subscriber function once and install its teardown.
///
/// # Panics
///
/// When the subscriber function fails during setup and the consumer does not
/// handle the error.
pub(crate) fn subscribe_with<Item: 'static, Err: 'static>(
  subscriber: &dyn Fn(SubscriptionObserver<Item, Err>) -> Result<Teardown, Err>,
  observer: Observer<Item, Err>,
) -> Subscription {
  let Observer { start, next, error, complete } = observer;
  let kernel = Rc::new(Kernel::new(next, error, complete));
  let subscription = Subscription::new(KernelSubscription(kernel.clone()));

  if let Some(start) = start {
    start(&subscription);
    if kernel.is_closed() {
      return subscription;
    }
  }

  match subscriber(SubscriptionObserver(kernel.clone())) {
    Ok(teardown) => kernel.install(teardown),
    Err(err) => {
      if SubscriptionObserver(kernel.clone()).error(err).is_err() {
        error!("subscriber function failed during setup and the error was not handled");
        panic!("unhandled error raised while setting up a subscription");
      }
    }
  }
  subscription
}
