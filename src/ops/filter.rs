use std::rc::Rc;

use super::forward;
use crate::{observable::Observable, subscriber::SubscriptionObserver};

/// Emit only those items from an observable that pass a predicate.
pub fn filter<T, E>(pred: impl Fn(&T) -> bool + 'static) -> impl FnOnce(Observable<T, E>) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
{
  move |source: Observable<T, E>| {
    let pred = Rc::new(pred);
    Observable::new(move |downstream: SubscriptionObserver<T, E>| {
      let pred = pred.clone();
      forward(&source, downstream, move |o, v| {
        if pred(&v) {
          o.next(v)
        }
      })
    })
  }
}
