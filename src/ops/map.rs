use std::rc::Rc;

use super::{forward, raise};
use crate::{observable::Observable, subscriber::SubscriptionObserver};

/// Creates a new stream which calls a closure on each element and uses its
/// return as the value.
///
/// A panic in `f` closes the upstream subscription and keeps unwinding into
/// whoever emitted the value.
pub fn map<T, U, E>(f: impl Fn(T) -> U + 'static) -> impl FnOnce(Observable<T, E>) -> Observable<U, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
{
  move |source: Observable<T, E>| {
    let f = Rc::new(f);
    Observable::new(move |downstream: SubscriptionObserver<U, E>| {
      let f = f.clone();
      forward(&source, downstream, move |o, v| o.next(f(v)))
    })
  }
}

/// Like [`map`], but `f` may fail; an `Err` is routed to the error handler
/// and ends the stream.
pub fn try_map<T, U, E>(
  f: impl Fn(T) -> Result<U, E> + 'static,
) -> impl FnOnce(Observable<T, E>) -> Observable<U, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
{
  move |source: Observable<T, E>| {
    let f = Rc::new(f);
    Observable::new(move |downstream: SubscriptionObserver<U, E>| {
      let f = f.clone();
      forward(&source, downstream, move |o, v| match f(v) {
        Ok(u) => o.next(u),
        Err(e) => raise(o, e),
      })
    })
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
  };

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn primitive_type() {
    let i = Rc::new(Cell::new(0));
    let c_i = i.clone();
    let source: Observable<i32> = from_iter(100..101);
    source
      .map(|v| v * 2)
      .subscribe_next(move |v| c_i.set(v));
    assert_eq!(i.get(), 200);
  }

  #[rxlite_macro::test]
  fn map_types_mixed() {
    let i = Rc::new(Cell::new(0));
    let c_i = i.clone();
    let source: Observable<char> = from_iter(vec!['a', 'b', 'c']);
    source
      .map(|_| 1)
      .subscribe_next(move |v| c_i.set(c_i.get() + v));
    assert_eq!(i.get(), 3);
  }

  #[rxlite_macro::test]
  fn try_map_routes_failures() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l_next, l_err) = (log.clone(), log.clone());
    let source: Observable<&str, String> = of(["1", "2", "x", "4"]);
    source
      .try_map(|v| v.parse::<i32>().map_err(|e| format!("{v}: {e}")))
      .subscribe_all(
        move |v| l_next.borrow_mut().push(v.to_string()),
        move |e| l_err.borrow_mut().push(e),
        || {},
      );
    assert_eq!(*log.borrow(), vec!["1", "2", "x: invalid digit found in string"]);
  }

  #[rxlite_macro::test]
  fn panicking_projection_closes_upstream() {
    let cleanups = Rc::new(Cell::new(0));
    let emitter: Rc<RefCell<Option<SubscriptionObserver<i32, Infallible>>>> = Rc::default();
    let (c_cleanups, c_emitter) = (cleanups.clone(), emitter.clone());
    let source = Observable::<i32>::new(move |o| {
      *c_emitter.borrow_mut() = Some(o);
      let c_cleanups = c_cleanups.clone();
      move || c_cleanups.set(c_cleanups.get() + 1)
    });

    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let _s = source
      .map(|v| 10 / v)
      .subscribe_next(move |v| c_seen.borrow_mut().push(v));

    let o = emitter.borrow().clone().unwrap();
    o.next(5);
    assert!(catch_unwind(AssertUnwindSafe(|| o.next(0))).is_err());
    o.next(1);
    assert_eq!(*seen.borrow(), vec![2]);
    assert!(o.is_closed());
    assert_eq!(cleanups.get(), 1);
  }
}
