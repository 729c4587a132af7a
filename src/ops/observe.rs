use std::{cell::Cell, rc::Rc};

use super::Upstream;
use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutRc, RcDerefMut},
  subscriber::SubscriptionObserver,
  subscription::{unsubscribe_all, DynamicSubscriptions, Subscription},
};

type Inners = MutRc<DynamicSubscriptions<Subscription>>;

/// Flatten a stream of streams: subscribe to every inner observable as it
/// arrives and interleave their values.
///
/// Completes once the outer stream and every inner stream it produced have
/// completed. An error from any of them ends the stream.
pub fn observe<T, E>() -> impl FnOnce(Observable<Observable<T, E>, E>) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
{
  move |outer_source: Observable<Observable<T, E>, E>| {
    Observable::new(move |downstream: SubscriptionObserver<T, E>| {
      let inners: Inners = MutRc::own(DynamicSubscriptions::new());
      let outer = Upstream::new();
      let active = Rc::new(Cell::new(0usize));
      let outer_done = Rc::new(Cell::new(false));

      let (n_inners, n_outer, n_active, n_done, n_downstream) =
        (inners.clone(), outer.clone(), active.clone(), outer_done.clone(), downstream.clone());
      let e_downstream = downstream.clone();
      let observer = Observer::new()
        .on_next(move |inner: Observable<T, E>| {
          if n_downstream.is_closed() {
            return;
          }
          n_active.set(n_active.get() + 1);
          let child = InnerObserver {
            id: n_inners.rc_deref_mut().reserve_id(),
            inners: n_inners.clone(),
            outer: n_outer.clone(),
            active: n_active.clone(),
            outer_done: n_done.clone(),
            downstream: n_downstream.clone(),
          };
          inner.subscribe(child.into_observer());
        })
        .on_error_forward(move |e| e_downstream.error(e))
        .on_complete(move || {
          outer_done.set(true);
          if active.get() == 0 {
            downstream.complete();
          }
        });
      outer.subscribe(&outer_source, observer);

      move || {
        outer.unsubscribe();
        unsubscribe_all(&inners);
      }
    })
  }
}

/// Alias of [`observe`].
pub fn merge_all<T, E>() -> impl FnOnce(Observable<Observable<T, E>, E>) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
{
  observe()
}

struct InnerObserver<T, E> {
  id: usize,
  inners: Inners,
  outer: Upstream,
  active: Rc<Cell<usize>>,
  outer_done: Rc<Cell<bool>>,
  downstream: SubscriptionObserver<T, E>,
}

impl<T: 'static, E: 'static> InnerObserver<T, E> {
  fn into_observer(self) -> Observer<T, E> {
    let Self { id, inners, outer, active, outer_done, downstream } = self;
    let (s_inners, n_inners, c_inners) = (inners.clone(), inners.clone(), inners);
    let (n_downstream, e_downstream) = (downstream.clone(), downstream.clone());
    Observer::new()
      .on_start(move |s| s_inners.rc_deref_mut().insert(id, s.clone()))
      .on_next(move |v| {
        n_downstream.next(v);
        if n_downstream.is_closed() {
          outer.unsubscribe();
          unsubscribe_all(&n_inners);
        }
      })
      .on_error_forward(move |e| e_downstream.error(e))
      .on_complete(move || {
        let _done = c_inners.rc_deref_mut().remove(id);
        active.set(active.get() - 1);
        if active.get() == 0 && outer_done.get() {
          downstream.complete();
        }
      })
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn synchronous_inners_in_order() {
    let seen = Rc::new(RefCell::new(vec![]));
    let done = Rc::new(Cell::new(false));
    let (c_seen, c_done) = (seen.clone(), done.clone());
    let first: Observable<i32> = of([1, 2]);
    let second: Observable<i32> = of([3]);
    let outer: Observable<Observable<i32>> = of([first, second]);
    outer.observe().subscribe_all(
      move |v| c_seen.borrow_mut().push(v),
      |_| {},
      move || c_done.set(true),
    );
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    assert!(done.get());
  }

  #[rxlite_macro::test]
  fn waits_for_outer_and_every_inner() {
    let done = Rc::new(Cell::new(false));
    let c_done = done.clone();
    let outer: Subject<Observable<i32>> = Subject::new();
    let inner: Subject<i32> = Subject::new();

    let _s = outer
      .to_observable()
      .pipe(ops::merge_all())
      .subscribe_all(|_| {}, |_| {}, move || c_done.set(true));

    outer.next(inner.to_observable());
    outer.complete();
    assert!(!done.get());
    inner.complete();
    assert!(done.get());
  }

  #[rxlite_macro::test]
  fn teardown_reaches_outer_and_inners() {
    let cleanups = Rc::new(RefCell::new(vec![]));
    let (c_outer, c_inner) = (cleanups.clone(), cleanups.clone());
    let inner = Observable::<i32>::new(move |o| {
      o.next(1);
      let c_inner = c_inner.clone();
      move || c_inner.borrow_mut().push("inner")
    });
    let outer = Observable::<Observable<i32>>::new(move |o| {
      o.next(inner.clone());
      let c_outer = c_outer.clone();
      move || c_outer.borrow_mut().push("outer")
    });

    let subscription = outer.observe().subscribe_next(|_| {});
    assert!(cleanups.borrow().is_empty());
    subscription.unsubscribe();
    assert_eq!(*cleanups.borrow(), vec!["outer", "inner"]);
  }
}
