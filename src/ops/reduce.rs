use std::{cell::RefCell, rc::Rc};

use super::{raise, Upstream};
use crate::{observable::Observable, observer::Observer, subscriber::SubscriptionObserver};

/// Fold every value into an accumulator that starts as `None`, and emit the
/// final accumulator once the source completes.
///
/// An empty source emits `None`.
pub fn reduce<T, U, E>(
  f: impl Fn(Option<U>, T) -> U + 'static,
) -> impl FnOnce(Observable<T, E>) -> Observable<Option<U>, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
{
  try_reduce(move |acc, v| Ok(f(acc, v)))
}

/// Like [`reduce`], but the fold may fail. An `Err` goes to the error handler
/// and unsubscribes the source; whatever the source still delivers is ignored.
pub fn try_reduce<T, U, E>(
  f: impl Fn(Option<U>, T) -> Result<U, E> + 'static,
) -> impl FnOnce(Observable<T, E>) -> Observable<Option<U>, E>
where
  T: 'static,
  U: 'static,
  E: 'static,
{
  move |source: Observable<T, E>| {
    let f = Rc::new(f);
    Observable::new(move |downstream: SubscriptionObserver<Option<U>, E>| {
      let f = f.clone();
      let acc: Rc<RefCell<Option<U>>> = Rc::default();
      let upstream = Upstream::new();

      let (c_acc, c_upstream, c_downstream) = (acc.clone(), upstream.clone(), downstream.clone());
      let (e_downstream, d_downstream) = (downstream.clone(), downstream);
      let observer = Observer::new()
        .on_next(move |v| {
          if c_downstream.is_closed() {
            return;
          }
          let prev = c_acc.borrow_mut().take();
          match f(prev, v) {
            Ok(next) => *c_acc.borrow_mut() = Some(next),
            Err(e) => {
              c_upstream.unsubscribe();
              raise(&c_downstream, e);
            }
          }
        })
        .on_error_forward(move |e| e_downstream.error(e))
        .on_complete(move || {
          let last = acc.borrow_mut().take();
          d_downstream.next(last);
          d_downstream.complete();
        });
      upstream.subscribe(&source, observer)
    })
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn concatenates_in_order() {
    let result = Rc::new(RefCell::new(vec![]));
    let c_result = result.clone();
    let source: Observable<i32> = of([1, 2, 3]);
    source
      .reduce(|acc: Option<String>, v| acc.unwrap_or_default() + &v.to_string())
      .subscribe_next(move |v| c_result.borrow_mut().push(v));
    assert_eq!(*result.borrow(), vec![Some("123".to_string())]);
  }

  #[rxlite_macro::test]
  fn empty_source_emits_none() {
    let result = Rc::new(RefCell::new(vec![]));
    let (c_result, done) = (result.clone(), Rc::new(RefCell::new(false)));
    let c_done = done.clone();
    let source: Observable<i32> = empty();
    source
      .reduce(|acc: Option<i32>, v| acc.unwrap_or(0) + v)
      .subscribe_all(move |v| c_result.borrow_mut().push(v), |_| {}, move || *c_done.borrow_mut() = true);
    assert_eq!(*result.borrow(), vec![None]);
    assert!(*done.borrow());
  }

  #[rxlite_macro::test]
  fn failing_fold_tears_the_source_down() {
    let pulled = Rc::new(RefCell::new(vec![]));
    let errors = Rc::new(RefCell::new(vec![]));
    let (c_pulled, c_errors) = (pulled.clone(), errors.clone());

    let source = Observable::<i32, String>::new(move |o| {
      for v in 1..=5 {
        if o.is_closed() {
          break;
        }
        c_pulled.borrow_mut().push(v);
        o.next(v);
      }
      o.complete();
    });

    source
      .try_reduce(|acc: Option<i32>, v| {
        if v == 3 { Err(format!("refused {v}")) } else { Ok(acc.unwrap_or(0) + v) }
      })
      .subscribe_all(|_| panic!("no value expected"), move |e| c_errors.borrow_mut().push(e), || {});

    assert_eq!(*pulled.borrow(), vec![1, 2, 3]);
    assert_eq!(*errors.borrow(), vec!["refused 3".to_string()]);
  }
}
