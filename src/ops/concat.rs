use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  observable::Observable,
  observer::Observer,
  subscriber::SubscriptionObserver,
  subscription::{Subscription, SubscriptionLike},
};

/// Subscribe to each source in turn, moving on when the previous one
/// completes. Completes after the last source; an error from any source ends
/// the whole stream.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let first: Observable<i32> = of([1, 2]);
/// let second: Observable<i32> = of([3, 4]);
/// ops::concat([first, second]).subscribe_next(|v| println!("{v}"));
/// ```
pub fn concat<T, E>(sources: impl IntoIterator<Item = Observable<T, E>>) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
{
  let sources: Rc<[Observable<T, E>]> = sources.into_iter().collect();
  Observable::new(move |downstream| {
    let concat = Rc::new(Concat {
      sources: sources.clone(),
      downstream,
      next_index: Cell::new(0),
      active: RefCell::new(None),
      torn_down: Cell::new(false),
      draining: Cell::new(false),
      advance_requested: Cell::new(false),
    });
    concat.advance();
    move || concat.teardown()
  })
}

struct Concat<T, E> {
  sources: Rc<[Observable<T, E>]>,
  downstream: SubscriptionObserver<T, E>,
  next_index: Cell<usize>,
  active: RefCell<Option<Subscription>>,
  torn_down: Cell<bool>,
  /// Set while `advance` runs, so a child completing synchronously inside its
  /// own `subscribe` queues the next step instead of recursing.
  draining: Cell<bool>,
  advance_requested: Cell<bool>,
}

impl<T: 'static, E: 'static> Concat<T, E> {
  fn advance(self: &Rc<Self>) {
    if self.draining.replace(true) {
      self.advance_requested.set(true);
      return;
    }
    loop {
      self.advance_requested.set(false);
      if self.torn_down.get() || self.downstream.is_closed() {
        break;
      }
      let index = self.next_index.get();
      let Some(source) = self.sources.get(index) else {
        self.downstream.complete();
        break;
      };
      self.next_index.set(index + 1);
      source.subscribe(self.child_observer());
      if !self.advance_requested.get() {
        break;
      }
    }
    self.draining.set(false);
  }

  fn child_observer(self: &Rc<Self>) -> Observer<T, E> {
    let (on_start, on_next, on_error, on_complete) = (self.clone(), self.clone(), self.clone(), self.clone());
    Observer::new()
      .on_start(move |s| *on_start.active.borrow_mut() = Some(s.clone()))
      .on_next(move |v| {
        on_next.downstream.next(v);
        if on_next.downstream.is_closed() {
          on_next.teardown();
        }
      })
      .on_error_forward(move |e| on_error.downstream.error(e))
      .on_complete(move || on_complete.advance())
  }

  fn teardown(&self) {
    self.torn_down.set(true);
    let active = self.active.borrow_mut().take();
    if let Some(active) = active {
      active.unsubscribe();
    }
  }
}
