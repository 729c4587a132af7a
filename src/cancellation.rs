//! One-shot cancellation signal for asynchronous bridges.
//!
//! A [`CancellationToken`] is the teardown of every task-backed source: the
//! subscription's cleanup fires the token, and the task races each await
//! against it with [`UntilCancelled`], so a pending wait is abandoned at the
//! next poll instead of delivering into a closed subscription.

use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter},
  future::Future,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

use pin_project_lite::pin_project;
use smallvec::SmallVec;

use crate::subscription::SubscriptionLike;

#[derive(Clone, Default)]
pub struct CancellationToken(Rc<TokenInner>);

#[derive(Default)]
struct TokenInner {
  cancelled: Cell<bool>,
  wakers: RefCell<SmallVec<[Waker; 1]>>,
}

impl CancellationToken {
  pub fn new() -> Self { Self::default() }

  /// Fire the token. Every pending [`Cancelled`] / [`UntilCancelled`] is
  /// woken; later calls do nothing.
  pub fn cancel(&self) {
    if self.0.cancelled.replace(true) {
      return;
    }
    let wakers = std::mem::take(&mut *self.0.wakers.borrow_mut());
    for waker in wakers {
      waker.wake();
    }
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.0.cancelled.get() }

  /// A future that resolves once the token fires.
  pub fn cancelled(&self) -> Cancelled { Cancelled { token: self.clone() } }

  /// Race `future` against this token. Resolves to `None` if the token fires
  /// first.
  pub fn run_until_cancelled<F: Future>(&self, future: F) -> UntilCancelled<F> {
    UntilCancelled { future, token: self.clone() }
  }

  fn register(&self, waker: &Waker) {
    let mut wakers = self.0.wakers.borrow_mut();
    if !wakers.iter().any(|w| w.will_wake(waker)) {
      wakers.push(waker.clone());
    }
  }
}

impl SubscriptionLike for CancellationToken {
  #[inline]
  fn unsubscribe(&self) { self.cancel() }

  #[inline]
  fn is_closed(&self) -> bool { self.is_cancelled() }
}

impl Debug for CancellationToken {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CancellationToken")
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}

/// Future returned by [`CancellationToken::cancelled`].
pub struct Cancelled {
  token: CancellationToken,
}

impl Future for Cancelled {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    if self.token.is_cancelled() {
      Poll::Ready(())
    } else {
      self.token.register(cx.waker());
      Poll::Pending
    }
  }
}

pin_project! {
  /// Future returned by [`CancellationToken::run_until_cancelled`].
  pub struct UntilCancelled<F> {
    #[pin]
    future: F,
    token: CancellationToken,
  }
}

impl<F: Future> Future for UntilCancelled<F> {
  type Output = Option<F::Output>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.project();
    if this.token.is_cancelled() {
      return Poll::Ready(None);
    }
    match this.future.poll(cx) {
      Poll::Ready(v) => Poll::Ready(Some(v)),
      Poll::Pending => {
        this.token.register(cx.waker());
        Poll::Pending
      }
    }
  }
}
