use std::rc::Rc;

use super::forward;
use crate::{observable::Observable, subscriber::SubscriptionObserver};

/// Map every value to an iterable and emit its elements one by one, in order.
pub fn flat_map<T, I, E>(f: impl Fn(T) -> I + 'static) -> impl FnOnce(Observable<T, E>) -> Observable<I::Item, E>
where
  T: 'static,
  I: IntoIterator,
  I::Item: 'static,
  E: 'static,
{
  move |source: Observable<T, E>| {
    let f = Rc::new(f);
    Observable::new(move |downstream: SubscriptionObserver<I::Item, E>| {
      let f = f.clone();
      forward(&source, downstream, move |o, v| {
        for item in f(v) {
          if o.is_closed() {
            break;
          }
          o.next(item);
        }
      })
    })
  }
}

/// Emit the elements of every iterable value one by one.
pub fn flatten<T, E>() -> impl FnOnce(Observable<T, E>) -> Observable<T::Item, E>
where
  T: IntoIterator + 'static,
  T::Item: 'static,
  E: 'static,
{
  flat_map(|v: T| v)
}
