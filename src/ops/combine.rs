use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutRc, RcDerefMut},
  subscriber::SubscriptionObserver,
  subscription::{unsubscribe_all, DynamicSubscriptions, Subscription},
};

/// Combine the latest value of every source.
///
/// Nothing is emitted until each source has produced a value. From then on,
/// every value from any source emits a `Vec` holding the latest value of each
/// source, in source order. Completes once all sources have completed.
pub fn combine<T, E>(sources: impl IntoIterator<Item = Observable<T, E>>) -> Observable<Vec<T>, E>
where
  T: Clone + 'static,
  E: 'static,
{
  let sources: Rc<[Observable<T, E>]> = sources.into_iter().collect();
  Observable::new(move |downstream: SubscriptionObserver<Vec<T>, E>| {
    let children: MutRc<DynamicSubscriptions<Subscription>> = MutRc::own(DynamicSubscriptions::new());
    let latest: Rc<RefCell<Vec<Option<T>>>> = Rc::new(RefCell::new(vec![None; sources.len()]));
    let pending = Rc::new(Cell::new(sources.len()));
    if sources.is_empty() {
      downstream.complete();
    }

    for (index, source) in sources.iter().enumerate() {
      if downstream.is_closed() {
        break;
      }
      let id = children.rc_deref_mut().reserve_id();
      let (s_children, n_children, c_children) = (children.clone(), children.clone(), children.clone());
      let (n_downstream, e_downstream, c_downstream) = (downstream.clone(), downstream.clone(), downstream.clone());
      let (latest, pending) = (latest.clone(), pending.clone());
      let observer = Observer::new()
        .on_start(move |s| s_children.rc_deref_mut().insert(id, s.clone()))
        .on_next(move |v| {
          let values: Option<Vec<T>> = {
            let mut latest = latest.borrow_mut();
            latest[index] = Some(v);
            latest.iter().cloned().collect()
          };
          if let Some(values) = values {
            n_downstream.next(values);
            if n_downstream.is_closed() {
              unsubscribe_all(&n_children);
            }
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
