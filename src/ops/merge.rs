use std::{cell::Cell, rc::Rc};

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutRc, RcDerefMut},
  subscriber::SubscriptionObserver,
  subscription::{unsubscribe_all, DynamicSubscriptions, Subscription},
};

/// Subscribe to every source at once and interleave their values.
///
/// Completes once every source has completed. The first error ends the
/// stream and unsubscribes the remaining sources.
pub fn merge<T, E>(sources: impl IntoIterator<Item = Observable<T, E>>) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
{
  let sources: Rc<[Observable<T, E>]> = sources.into_iter().collect();
  Observable::new(move |downstream: SubscriptionObserver<T, E>| {
    let children: MutRc<DynamicSubscriptions<Subscription>> = MutRc::own(DynamicSubscriptions::new());
    let pending = Rc::new(Cell::new(sources.len()));
    if sources.is_empty() {
      downstream.complete();
    }

    for source in sources.iter() {
      if downstream.is_closed() {
        break;
      }
      let id = children.rc_deref_mut().reserve_id();
      let (s_children, n_children, c_children) = (children.clone(), children.clone(), children.clone());
      let (n_downstream, e_downstream, c_downstream) = (downstream.clone(), downstream.clone(), downstream.clone());
      let pending = pending.clone();
      let observer = Observer::new()
        .on_start(move |s| s_children.rc_deref_mut().insert(id, s.clone()))
        .on_next(move |v| {
          n_downstream.next(v);
          if n_downstream.is_closed() {
            unsubscribe_all(&n_children);
          }
        })
        .on_error_forward(move |e| e_downstream.error(e))
        .on_complete(move || {
          let _done = c_children.rc_deref_mut().remove(id);
          pending.set(pending.get() - 1);
          if pending.get() == 0 {
            c_downstream.complete();
          }
        });
      source.subscribe(observer);
    }

    move || unsubscribe_all(&children)
  })
}
